//! The package support script
//!
//! A fixed decision tree covering missing tracking updates, packages that
//! never arrived and packages that arrived damaged.

mod steps;
pub mod validate;

use crate::state_machine::{Choice, PromptSpec, RegistryError, StepId, StepKind, StepRegistry};
use steps::{CarrierStep, FreeTextStep, Menu, TicketStep, TrackingStatusStep};

pub const START: StepId = StepId::from_static("start");
pub const ASK_TRACKING_NUMBER: StepId = StepId::from_static("ask_tracking_number");
pub const ASK_CARRIER: StepId = StepId::from_static("ask_carrier");
pub const SHOW_TRACKING_STATUS: StepId = StepId::from_static("show_tracking_status");
pub const ALERTS_CONFIGURED: StepId = StepId::from_static("alerts_configured");
pub const ASK_EXPECTED_DATE: StepId = StepId::from_static("ask_expected_date");
pub const INVESTIGATION_OPENED: StepId = StepId::from_static("investigation_opened");
pub const ASK_DAMAGE_DESCRIPTION: StepId = StepId::from_static("ask_damage_description");
pub const CLAIM_FILED: StepId = StepId::from_static("claim_filed");
pub const DAMAGE_TIPS: StepId = StepId::from_static("damage_tips");
pub const OFF_TOPIC: StepId = StepId::from_static("off_topic");
pub const AGENT_TRANSFER: StepId = StepId::from_static("agent_transfer");
pub const CLOSING: StepId = StepId::from_static("closing");

/// Answer field names
pub mod fields {
    pub const TRACKING_NUMBER: &str = "tracking_number";
    pub const CARRIER: &str = "carrier";
    pub const EXPECTED_DATE: &str = "expected_date";
    pub const INVESTIGATION_ID: &str = "investigation_id";
    pub const DAMAGE_DESCRIPTION: &str = "damage_description";
    pub const CLAIM_ID: &str = "claim_id";
}

const DAMAGE_TIPS_COPY: &str = "While you wait:

- Photograph the damage from multiple angles.
- Keep original packaging for the carrier inspection.
- Store items in a dry place to prevent further issues.";

fn agent_or_done() -> Vec<Choice> {
    vec![
        Choice::goto("Talk to an agent", AGENT_TRANSFER),
        Choice::goto("All set", CLOSING),
    ]
}

/// Build the registry for the support conversation
pub fn build_registry() -> Result<StepRegistry, RegistryError> {
    StepRegistry::builder(START)
        .step(
            START,
            StepKind::entry(Menu::new(
                "Hi, I'm Boxy! Can I assist you with your lost package today?",
                vec![
                    Choice::goto("No tracking updates", ASK_TRACKING_NUMBER),
                    Choice::goto("Package seems missing", ASK_EXPECTED_DATE),
                    Choice::goto("Package arrived damaged", ASK_DAMAGE_DESCRIPTION),
                    Choice::goto("Something else", OFF_TOPIC),
                ],
            )),
        )
        .step(
            ASK_TRACKING_NUMBER,
            StepKind::text(FreeTextStep {
                question: "I can check what we know so far. Please enter your tracking number.",
                prompt: PromptSpec::new("Tracking number")
                    .placeholder("1Z999AA10123456784")
                    .hint("Use 8-22 letters or numbers."),
                field: fields::TRACKING_NUMBER,
                validate: steps::tracking_number,
                acknowledge: |number| format!("Thanks! Got it: {number}."),
                next: ASK_CARRIER,
            }),
        )
        .step(ASK_CARRIER, StepKind::choice(CarrierStep))
        .step(SHOW_TRACKING_STATUS, StepKind::entry(TrackingStatusStep))
        .step(
            ALERTS_CONFIGURED,
            StepKind::entry(Menu::new(
                "Alerts are on! You will get notifications for every scan and on delivery day.",
                agent_or_done(),
            )),
        )
        .step(
            ASK_EXPECTED_DATE,
            StepKind::text(FreeTextStep {
                question: "I can start an investigation. When was the package supposed to arrive? (MM/DD/YYYY)",
                prompt: PromptSpec::new("Expected delivery date")
                    .placeholder("03/22/2024")
                    .hint("Use MM/DD/YYYY and choose a past date."),
                field: fields::EXPECTED_DATE,
                validate: steps::expected_date,
                acknowledge: |date| format!("Thanks, noted {date}. Starting an investigation ticket now."),
                next: INVESTIGATION_OPENED,
            }),
        )
        .step(
            INVESTIGATION_OPENED,
            StepKind::entry(TicketStep {
                prefix: "INV",
                field: fields::INVESTIGATION_ID,
                announce: |ticket| {
                    format!("Ticket {ticket} is open. Our team will review scans and reach out within 24 hours.")
                },
                choices: agent_or_done(),
            }),
        )
        .step(
            ASK_DAMAGE_DESCRIPTION,
            StepKind::text(FreeTextStep {
                question: "I am so sorry to hear that. Can you describe the damage?",
                prompt: PromptSpec::new("Damage description")
                    .placeholder("e.g. Box crushed and item dented")
                    .hint("A short description helps us document the claim."),
                field: fields::DAMAGE_DESCRIPTION,
                validate: steps::damage_description,
                acknowledge: |_| "Thanks. I will file a claim right away.".to_string(),
                next: CLAIM_FILED,
            }),
        )
        .step(
            CLAIM_FILED,
            StepKind::entry(TicketStep {
                prefix: "CLM",
                field: fields::CLAIM_ID,
                announce: |ticket| {
                    format!(
                        "Claim {ticket} is submitted. Please hang onto the packaging until our partner reviews photos."
                    )
                },
                choices: vec![
                    Choice::goto("Care tips while you wait", DAMAGE_TIPS),
                    Choice::goto("All set", CLOSING),
                ],
            }),
        )
        .step(
            DAMAGE_TIPS,
            StepKind::entry(Menu::new(DAMAGE_TIPS_COPY, vec![Choice::goto("All set", CLOSING)])),
        )
        .step(
            OFF_TOPIC,
            StepKind::entry(Menu::new(
                "I'm here for package problems. Would you like to keep troubleshooting or speak with an agent?",
                vec![
                    Choice::goto("Keep troubleshooting", START),
                    Choice::goto("Talk to an agent", AGENT_TRANSFER),
                ],
            )),
        )
        .step(
            AGENT_TRANSFER,
            StepKind::entry(Menu::new(
                "No worries, I am sending this conversation to a human teammate. Someone will join in under 2 minutes.",
                vec![Choice::goto("Start over", START)],
            )),
        )
        .step(
            CLOSING,
            StepKind::entry(Menu::new(
                "Glad I could help! If something else pops up, just start again.",
                vec![Choice::goto("Restart", START)],
            )),
        )
        .fallback(
            "Let's keep things package related. Would you like to resume troubleshooting or talk with an agent?",
            vec![
                Choice::goto("Resume troubleshooting", START),
                Choice::goto("Talk to an agent", AGENT_TRANSFER),
            ],
        )
        .build()
}
