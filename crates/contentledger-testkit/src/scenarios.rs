//! Canned end-to-end scenarios.
//!
//! Each scenario is a sequence of dispatched calls with the response every
//! call must produce. Scenarios run against a fresh [`TestFixture`], so ids
//! start at zero and the clock starts at zero.

use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::fixtures::{principal, sample_create_args, TestFixture, CREATOR, USER};

/// Third principal used by the transfer chains.
pub const OTHER: &str = "ST3NBRSFKX28FQ2ZJ1MAKX58HKHSDGNV5N7R21XCP";

/// Expected outcome of a call.
#[derive(Debug, Clone, PartialEq)]
pub enum Expect {
    /// Success with exactly this value.
    Value(Value),
    /// Success with an object containing at least these fields.
    Fields(Value),
    /// Failure with this code.
    Error(u16),
}

/// One step of a scenario.
#[derive(Debug, Clone)]
pub enum Step {
    Call {
        caller: &'static str,
        method: &'static str,
        args: Vec<Value>,
        expect: Expect,
    },
    /// Move the fixture clock forward.
    Advance(u64),
}

impl Step {
    fn call(caller: &'static str, method: &'static str, args: Vec<Value>, expect: Expect) -> Self {
        Step::Call {
            caller,
            method,
            args,
            expect,
        }
    }
}

/// A named scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub steps: Vec<Step>,
}

/// A scenario step whose response did not match.
#[derive(Debug, Error)]
#[error("scenario {scenario}: step {step} ({method}) expected {expected}, got {actual}")]
pub struct ScenarioFailure {
    pub scenario: &'static str,
    pub step: usize,
    pub method: &'static str,
    pub expected: String,
    pub actual: Value,
}

fn update_args(id: u64, price: u64, royalty: u64) -> Vec<Value> {
    vec![
        json!(id),
        json!("Updated Title"),
        json!("Updated Description"),
        json!("QmUpdated"),
        json!(price),
        json!(royalty),
    ]
}

fn create_args(price: u64, royalty: u64) -> Vec<Value> {
    vec![
        json!("Test Content"),
        json!("Description"),
        json!("QmHash"),
        json!(price),
        json!(royalty),
    ]
}

fn ok(value: Value) -> Expect {
    Expect::Value(value)
}

/// Purchase then revenue readback.
pub fn scenario_purchase_revenue() -> Scenario {
    Scenario {
        name: "purchase-revenue",
        steps: vec![
            Step::call(CREATOR, "create-content", create_args(100, 10), ok(json!(0))),
            Step::call(USER, "purchase-content", vec![json!(0)], ok(json!(true))),
            Step::call(
                USER,
                "get-content-revenue",
                vec![json!(0)],
                ok(json!({ "total-revenue": 100 })),
            ),
        ],
    }
}

/// A rejected royalty consumes no id.
pub fn scenario_royalty_rejected() -> Scenario {
    Scenario {
        name: "royalty-rejected",
        steps: vec![
            Step::call(CREATOR, "create-content", create_args(100, 100), Expect::Error(400)),
            Step::call(CREATOR, "get-content", vec![json!(0)], ok(Value::Null)),
            Step::call(CREATOR, "create-content", create_args(100, 10), ok(json!(0))),
        ],
    }
}

/// Creator rights outlive a chain of transfers.
pub fn scenario_transfer_chain() -> Scenario {
    Scenario {
        name: "transfer-chain",
        steps: vec![
            Step::call(CREATOR, "create-content", create_args(100, 10), ok(json!(0))),
            Step::call(
                CREATOR,
                "transfer-content",
                vec![json!(0), json!(USER)],
                ok(json!(true)),
            ),
            Step::call(
                USER,
                "transfer-content",
                vec![json!(0), json!(OTHER)],
                ok(json!(true)),
            ),
            Step::call(CREATOR, "update-content", update_args(0, 150, 15), ok(json!(true))),
            Step::call(USER, "update-content", update_args(0, 1, 1), Expect::Error(401)),
            Step::call(
                CREATOR,
                "get-content",
                vec![json!(0)],
                Expect::Fields(json!({
                    "creator": CREATOR,
                    "owner": OTHER,
                    "price": 150,
                    "royalty-percentage": 15,
                })),
            ),
        ],
    }
}

/// The registry call contract.
pub fn scenario_content_contract() -> Scenario {
    Scenario {
        name: "content-contract",
        steps: vec![
            Step::call(CREATOR, "create-content", sample_create_args(), ok(json!(0))),
            Step::call(CREATOR, "create-content", create_args(100, 150), Expect::Error(400)),
            Step::call(CREATOR, "update-content", update_args(0, 150, 15), ok(json!(true))),
            Step::call(USER, "update-content", update_args(0, 150, 15), Expect::Error(401)),
            Step::call(CREATOR, "update-content", update_args(999, 150, 15), Expect::Error(404)),
            Step::call(
                USER,
                "transfer-content",
                vec![json!(0), json!(USER)],
                Expect::Error(401),
            ),
            Step::call(
                CREATOR,
                "transfer-content",
                vec![json!(0), json!(USER)],
                ok(json!(true)),
            ),
            Step::call(
                USER,
                "get-content",
                vec![json!(0)],
                Expect::Fields(json!({
                    "id": 0,
                    "creator": CREATOR,
                    "owner": USER,
                    "title": "Updated Title",
                    "ipfs-hash": "QmUpdated",
                    "total-revenue": 0,
                })),
            ),
            Step::call(USER, "get-content", vec![json!(999)], ok(Value::Null)),
        ],
    }
}

/// The access call contract.
pub fn scenario_access_contract() -> Scenario {
    Scenario {
        name: "access-contract",
        steps: vec![
            Step::call(CREATOR, "create-content", sample_create_args(), ok(json!(0))),
            Step::call(
                USER,
                "is-subscribed",
                vec![json!(USER), json!(0)],
                ok(json!(false)),
            ),
            Step::call(USER, "purchase-content", vec![json!(0)], ok(json!(true))),
            Step::call(USER, "purchase-content", vec![json!(999)], Expect::Error(404)),
            Step::call(
                USER,
                "is-subscribed",
                vec![json!(USER), json!(0)],
                ok(json!(true)),
            ),
            Step::call(
                USER,
                "get-accessible-contents",
                vec![json!(USER)],
                ok(json!([0])),
            ),
            // Repeat purchase charges nothing.
            Step::call(USER, "purchase-content", vec![json!(0)], ok(json!(true))),
            Step::call(
                USER,
                "get-content-revenue",
                vec![json!(0)],
                ok(json!({ "total-revenue": 100 })),
            ),
        ],
    }
}

/// Revenue recording and royalty earnings.
pub fn scenario_revenue_contract() -> Scenario {
    Scenario {
        name: "revenue-contract",
        steps: vec![
            Step::call(CREATOR, "create-content", sample_create_args(), ok(json!(0))),
            Step::call(
                USER,
                "get-content-revenue",
                vec![json!(0)],
                ok(json!({ "total-revenue": 0 })),
            ),
            Step::call(
                USER,
                "get-content-revenue",
                vec![json!(999)],
                ok(json!({ "total-revenue": 0 })),
            ),
            Step::call(
                CREATOR,
                "record-revenue",
                vec![json!(0), json!(100)],
                ok(json!(true)),
            ),
            Step::call(
                CREATOR,
                "record-revenue",
                vec![json!(999), json!(100)],
                Expect::Error(404),
            ),
            Step::call(
                CREATOR,
                "record-revenue",
                vec![json!(0), json!(-5)],
                Expect::Error(400),
            ),
            Step::call(
                CREATOR,
                "transfer-content",
                vec![json!(0), json!(OTHER)],
                ok(json!(true)),
            ),
            Step::call(USER, "purchase-content", vec![json!(0)], ok(json!(true))),
            Step::call(
                USER,
                "get-content",
                vec![json!(0)],
                Expect::Fields(json!({ "total-revenue": 200 })),
            ),
            Step::call(USER, "get-earnings", vec![json!(CREATOR)], ok(json!(10))),
            Step::call(USER, "get-earnings", vec![json!(OTHER)], ok(json!(90))),
        ],
    }
}

/// A subscription lapses at its expiry and renews from the call time.
pub fn scenario_subscription_expiry() -> Scenario {
    const DAY: u64 = 24 * 60 * 60 * 1000;

    Scenario {
        name: "subscription-expiry",
        steps: vec![
            Step::call(CREATOR, "create-content", sample_create_args(), ok(json!(0))),
            Step::call(USER, "subscribe-content", vec![json!(0)], ok(json!(true))),
            Step::call(
                USER,
                "is-subscribed",
                vec![json!(USER), json!(0)],
                ok(json!(true)),
            ),
            Step::Advance(30 * DAY - 1),
            Step::call(
                USER,
                "is-subscribed",
                vec![json!(USER), json!(0)],
                ok(json!(true)),
            ),
            Step::Advance(1),
            Step::call(
                USER,
                "is-subscribed",
                vec![json!(USER), json!(0)],
                ok(json!(false)),
            ),
            Step::call(USER, "subscribe-content", vec![json!(0)], ok(json!(true))),
            Step::call(
                USER,
                "is-subscribed",
                vec![json!(USER), json!(0)],
                ok(json!(true)),
            ),
            Step::call(
                USER,
                "get-content-revenue",
                vec![json!(0)],
                ok(json!({ "total-revenue": 200 })),
            ),
        ],
    }
}

/// Every canned scenario.
pub fn all_scenarios() -> Vec<Scenario> {
    vec![
        scenario_purchase_revenue(),
        scenario_royalty_rejected(),
        scenario_transfer_chain(),
        scenario_content_contract(),
        scenario_access_contract(),
        scenario_revenue_contract(),
        scenario_subscription_expiry(),
    ]
}

fn matches(expect: &Expect, response: &Value) -> bool {
    match expect {
        Expect::Value(value) => {
            response["success"] == json!(true) && &response["value"] == value
        }
        Expect::Fields(fields) => {
            response["success"] == json!(true)
                && match (fields.as_object(), response["value"].as_object()) {
                    (Some(want), Some(got)) => is_subset(want, got),
                    _ => false,
                }
        }
        Expect::Error(code) => {
            response["success"] == json!(false) && response["error"] == json!(code)
        }
    }
}

fn is_subset(want: &Map<String, Value>, got: &Map<String, Value>) -> bool {
    want.iter().all(|(k, v)| got.get(k) == Some(v))
}

/// Run a scenario against a fresh fixture.
pub async fn run_scenario(scenario: &Scenario) -> Result<(), ScenarioFailure> {
    let fixture = TestFixture::new();

    for (idx, step) in scenario.steps.iter().enumerate() {
        match step {
            Step::Advance(millis) => fixture.advance(*millis),
            Step::Call {
                caller,
                method,
                args,
                expect,
            } => {
                let caller = principal(caller);
                let response = fixture.call(&caller, method, args.clone()).await;
                if !matches(expect, &response) {
                    return Err(ScenarioFailure {
                        scenario: scenario.name,
                        step: idx,
                        method: *method,
                        expected: format!("{:?}", expect),
                        actual: response,
                    });
                }
            }
        }
    }

    Ok(())
}
