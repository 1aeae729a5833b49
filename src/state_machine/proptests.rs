//! Property-based tests for the state machine
//!
//! These tests drive the support script with arbitrary input and check
//! that key invariants hold after every transition.

use super::*;
use crate::runtime::testing::ScriptDriver;
use crate::script::{self, fields};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

/// Inputs a user might plausibly send, valid and invalid
fn arb_submission() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("No tracking updates".to_string()),
        Just("package seems missing".to_string()),
        Just("  PACKAGE ARRIVED DAMAGED ".to_string()),
        Just("All set".to_string()),
        Just("talk to an agent".to_string()),
        Just("Restart".to_string()),
        Just("ups".to_string()),
        Just("1z999aa10123456784".to_string()),
        Just("03/20/2024".to_string()),
        Just("2099-01-01".to_string()),
        Just("Box was crushed in transit".to_string()),
        "[a-zA-Z0-9 ]{0,24}",
        "[ \t]{0,4}",
    ]
}

#[derive(Debug, Clone)]
enum Action {
    Submit(String),
    Click(usize),
    /// Fire pending entries, as the timer would
    Settle,
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        4 => arb_submission().prop_map(Action::Submit),
        3 => (0usize..5).prop_map(Action::Click),
        3 => Just(Action::Settle),
    ]
}

fn apply(driver: &mut ScriptDriver, action: &Action) {
    match action {
        Action::Submit(text) => {
            let _ = driver.dispatch(Event::submitted(text.clone()));
        }
        Action::Click(index) => {
            let _ = driver.dispatch(Event::ChoiceClicked { index: *index });
        }
        Action::Settle => driver.settle(),
    }
}

fn arb_history() -> impl Strategy<Value = Vec<Action>> {
    proptest::collection::vec(arb_action(), 0..16)
}

/// A started script driver after replaying `history`
fn driver_after(history: &[Action]) -> ScriptDriver {
    let mut driver = ScriptDriver::script();
    driver.start();
    for action in history {
        apply(&mut driver, action);
    }
    driver
}

// ============================================================================
// Invariant Checkers
// ============================================================================

/// At most one of {open prompt, typed choice matching} drives the text field
fn input_is_exclusive(session: &Session) -> bool {
    !(session.prompt.is_some() && session.choice_typing)
}

fn typing_has_choices(session: &Session) -> bool {
    !session.choice_typing || !session.offered().is_empty()
}

fn current_step_registered(driver: &ScriptDriver) -> bool {
    driver
        .session
        .current_step
        .as_ref()
        .is_some_and(|step| driver.context.registry.contains(step))
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // Invariant 1: the session stays well-formed under any input sequence
    #[test]
    fn prop_session_stays_valid(
        history in arb_history(),
        actions in proptest::collection::vec(arb_action(), 0..12)
    ) {
        let mut driver = driver_after(&history);
        for action in &actions {
            apply(&mut driver, action);
            prop_assert!(input_is_exclusive(&driver.session), "{:?}", driver.session);
            prop_assert!(typing_has_choices(&driver.session), "{:?}", driver.session);
            prop_assert!(current_step_registered(&driver));
        }
    }

    // Invariant 2: blank input never echoes and never changes state
    #[test]
    fn prop_blank_input_is_inert(history in arb_history(), blank in "[ \t\r\n]{0,8}") {
        let mut driver = driver_after(&history);
        let before = driver.session.clone();
        let effects = driver.dispatch(Event::submitted(blank)).unwrap();
        prop_assert!(effects.is_empty());
        prop_assert_eq!(&driver.session, &before);
    }

    // Invariant 3: typing an offered label is the same as clicking it
    #[test]
    fn prop_typed_label_equals_click(history in arb_history(), pick in any::<prop::sample::Index>()) {
        let driver = driver_after(&history);
        prop_assume!(driver.session.choice_typing);
        let offered = driver.session.offered().to_vec();
        let index = pick.index(offered.len());
        // Duplicate labels resolve to the first match
        prop_assume!(offered.iter().position(|c| c.matches(&offered[index].label)) == Some(index));

        let mut clicked = driver;
        let mut typed = ScriptDriver::script();
        typed.session = clicked.session.clone();

        let typed_label = format!("  {}  ", offered[index].label.to_uppercase());
        let click = clicked.dispatch(Event::ChoiceClicked { index });
        let typing = typed.dispatch(Event::submitted(typed_label));

        match (click, typing) {
            (Ok(click), Ok(typing)) => {
                prop_assert_eq!(&click[1..], &typing[1..]);
                prop_assert_eq!(&clicked.session, &typed.session);
            }
            (Err(click), Err(typing)) => prop_assert_eq!(click, typing),
            (click, typing) => prop_assert!(false, "diverged: {:?} vs {:?}", click, typing),
        }
    }

    // Invariant 4: a rejected tracking number leaves answers and step alone
    #[test]
    fn prop_rejected_tracking_number_keeps_state(raw in "[a-zA-Z0-9]{1,7}|[a-zA-Z0-9]{23,30}|[a-z]{4}-[0-9]{6}") {
        let mut driver = ScriptDriver::script();
        driver.start();
        driver.submit("No tracking updates");
        let before = driver.session.answers.clone();

        let effects = driver.submit(&raw);

        prop_assert_eq!(&driver.session.answers, &before);
        prop_assert_eq!(driver.current_step(), Some("ask_tracking_number"));
        prop_assert!(driver.session.prompt.is_some());
        prop_assert!(effects.contains(&Effect::FocusInput));
    }

    // Invariant 5: accepted tracking numbers are stored normalized
    #[test]
    fn prop_tracking_number_stored_normalized(raw in "[a-zA-Z0-9]{8,11}( [a-zA-Z0-9]{1,11})?") {
        let mut driver = ScriptDriver::script();
        driver.start();
        driver.submit("No tracking updates");
        driver.submit(&raw);

        let expected = raw.replace(' ', "").to_uppercase();
        prop_assert_eq!(driver.session.answers.get(fields::TRACKING_NUMBER), Some(expected.as_str()));
        prop_assert_eq!(driver.current_step(), Some("ask_carrier"));
    }

    // Invariant 6: advancing to an unregistered step changes nothing
    #[test]
    fn prop_unknown_step_is_noop(history in arb_history(), name in "[a-z_]{3,12}") {
        let mut driver = driver_after(&history);
        let target = StepId::new(format!("missing_{name}"));
        prop_assume!(!driver.context.registry.contains(&target));
        prop_assume!(driver.session.choice_typing);

        let owner = ChoiceOwner::Fallback;
        driver.session.offer(owner, vec![Choice::goto("Jump", target.clone())]);
        let before = driver.session.clone();

        let result = driver.dispatch(Event::ChoiceClicked { index: 0 });
        prop_assert_eq!(result.unwrap_err(), TransitionError::UnknownStep(target));
        prop_assert_eq!(&driver.session, &before);
    }

    // Invariant 7: only restart clears answers; other steps never drop them
    #[test]
    fn prop_answers_only_grow_until_restart(
        actions in proptest::collection::vec(arb_action(), 1..24)
    ) {
        let mut driver = ScriptDriver::script();
        driver.start();
        for action in &actions {
            let before = driver.session.answers.clone();
            let seq_before = driver.session.entry_seq;
            apply(&mut driver, action);

            let restarted = driver.session.current_step.as_ref() == Some(&script::START)
                && driver.session.entry_seq != seq_before;
            if !restarted {
                prop_assert!(driver.session.answers.len() >= before.len());
            }
        }
    }
}
