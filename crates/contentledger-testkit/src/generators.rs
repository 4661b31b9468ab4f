//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{json, Value};

use contentledger::{Ledger, Response};
use contentledger_core::{ContentMetadata, Principal, RoyaltyPercentage};
use contentledger_store::Store;

use contentledger::ManualClock;

/// Generate a principal.
pub fn principal() -> impl Strategy<Value = Principal> {
    "ST[0-9A-Z]{1,38}".prop_filter_map("empty principal", |s| Principal::new(s).ok())
}

/// Generate a royalty percentage in `[0, 100)`.
pub fn royalty_percentage() -> impl Strategy<Value = RoyaltyPercentage> {
    (0u64..100).prop_filter_map("out of range", |p| RoyaltyPercentage::new(p).ok())
}

/// Generate a raw royalty, valid or not.
pub fn raw_royalty() -> impl Strategy<Value = u64> {
    prop_oneof![3 => 0u64..100, 1 => 100u64..=255, 1 => Just(u64::MAX)]
}

/// Generate a price small enough that many payments cannot overflow.
pub fn price() -> impl Strategy<Value = u64> + Clone {
    0u64..=1_000_000
}

/// Generate valid metadata.
pub fn metadata() -> impl Strategy<Value = ContentMetadata> {
    (
        "[A-Za-z0-9 ]{0,64}",
        "[A-Za-z0-9 .,]{0,128}",
        "Qm[1-9A-HJ-NP-Za-km-z]{44}",
        price(),
        royalty_percentage(),
    )
        .prop_map(|(title, description, content_hash, price, royalty)| ContentMetadata {
            title,
            description,
            content_hash,
            price,
            royalty_percentage: royalty,
        })
}

/// One step of a random ledger workload.
///
/// Callers and content ids are small indexes so that steps collide often:
/// `caller` picks from the party list and `content` may name an id that does
/// not exist yet.
#[derive(Debug, Clone)]
pub enum Operation {
    Create {
        caller: usize,
        price: u64,
        royalty: u64,
    },
    Update {
        caller: usize,
        content: u64,
        price: u64,
        royalty: u64,
    },
    Transfer {
        caller: usize,
        content: u64,
        to: usize,
    },
    Purchase {
        caller: usize,
        content: u64,
    },
    Subscribe {
        caller: usize,
        content: u64,
    },
    RecordRevenue {
        caller: usize,
        content: u64,
        amount: u64,
    },
    Advance {
        millis: u64,
    },
}

/// Number of parties an [`Operation`] can name.
pub const PARTIES: usize = 4;

/// Highest content id an [`Operation`] names.
pub const MAX_CONTENT: u64 = 6;

/// Generate an amount from either end of the `u64` range.
///
/// Values above `i64::MAX` are included so backends that store signed
/// integers are exercised too.
pub fn wide_amount() -> impl Strategy<Value = u64> + Clone {
    prop_oneof![
        2 => 0u64..=1_000,
        1 => (i64::MAX as u64)..=u64::MAX,
        1 => Just(u64::MAX),
    ]
}

/// Generate an [`Operation`] with prices and revenue amounts drawn from the
/// given strategies.
pub fn operation<P, A>(price: P, amount: A) -> BoxedStrategy<Operation>
where
    P: Strategy<Value = u64> + Clone + 'static,
    A: Strategy<Value = u64> + 'static,
{
    let caller = 0..PARTIES;
    let content = 0..=MAX_CONTENT;

    prop_oneof![
        3 => (caller.clone(), price.clone(), raw_royalty())
            .prop_map(|(caller, price, royalty)| Operation::Create { caller, price, royalty }),
        1 => (caller.clone(), content.clone(), price, raw_royalty()).prop_map(
            |(caller, content, price, royalty)| Operation::Update { caller, content, price, royalty }
        ),
        1 => (caller.clone(), content.clone(), 0..PARTIES)
            .prop_map(|(caller, content, to)| Operation::Transfer { caller, content, to }),
        3 => (caller.clone(), content.clone())
            .prop_map(|(caller, content)| Operation::Purchase { caller, content }),
        2 => (caller.clone(), content.clone())
            .prop_map(|(caller, content)| Operation::Subscribe { caller, content }),
        2 => (caller, content, amount).prop_map(|(caller, content, amount)| {
            Operation::RecordRevenue { caller, content, amount }
        }),
        1 => (1u64..=5_000_000_000).prop_map(|millis| Operation::Advance { millis }),
    ]
    .boxed()
}

impl Arbitrary for Operation {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        operation(price(), 0u64..=10_000)
    }
}

impl Operation {
    /// The call this operation makes, or `None` for a clock step.
    pub fn to_call(&self) -> Option<(usize, &'static str, Vec<Value>)> {
        let call = match *self {
            Operation::Create {
                caller,
                price,
                royalty,
            } => (
                caller,
                "create-content",
                vec![json!("Title"), json!("Desc"), json!("QmHash"), json!(price), json!(royalty)],
            ),
            Operation::Update {
                caller,
                content,
                price,
                royalty,
            } => (
                caller,
                "update-content",
                vec![
                    json!(content),
                    json!("New Title"),
                    json!("New Desc"),
                    json!("QmNew"),
                    json!(price),
                    json!(royalty),
                ],
            ),
            Operation::Transfer {
                caller,
                content,
                to,
            } => (
                caller,
                "transfer-content",
                vec![json!(content), json!(party_name(to))],
            ),
            Operation::Purchase { caller, content } => {
                (caller, "purchase-content", vec![json!(content)])
            }
            Operation::Subscribe { caller, content } => {
                (caller, "subscribe-content", vec![json!(content)])
            }
            Operation::RecordRevenue {
                caller,
                content,
                amount,
            } => (caller, "record-revenue", vec![json!(content), json!(amount)]),
            Operation::Advance { .. } => return None,
        };
        Some(call)
    }
}

/// Name of party `idx`.
pub fn party_name(idx: usize) -> String {
    format!("ST{:02}PARTY", idx)
}

/// The principals [`Operation`]s name, in index order.
pub fn parties() -> Vec<Principal> {
    (0..PARTIES)
        .filter_map(|i| Principal::new(party_name(i)).ok())
        .collect()
}

/// Apply one operation to a ledger driven by a manual clock.
///
/// Clock steps return `None`.
pub async fn apply_operation<S: Store>(
    ledger: &Ledger<S, ManualClock>,
    parties: &[Principal],
    op: &Operation,
) -> Option<Response> {
    match op.to_call() {
        Some((caller, method, args)) => Some(ledger.call(&parties[caller], method, &args).await),
        None => {
            if let Operation::Advance { millis } = op {
                ledger.clock().advance(*millis);
            }
            None
        }
    }
}
