//! Request dispatch.
//!
//! Maps a method name plus positional JSON arguments onto a typed
//! [`Request`], runs it against a [`Ledger`], and reports the outcome as a
//! tagged [`Response`]:
//!
//! ```json
//! {"success": true, "value": 0}
//! {"success": false, "error": 401}
//! ```
//!
//! | method | args |
//! |---|---|
//! | `create-content` | title, description, ipfs-hash, price, royalty |
//! | `update-content` | id, title, description, ipfs-hash, price, royalty |
//! | `transfer-content` | id, new-owner |
//! | `purchase-content` | id |
//! | `subscribe-content` | id |
//! | `record-revenue` | id, amount |
//! | `get-content` | id |
//! | `get-content-revenue` | id |
//! | `is-subscribed` | user, id |
//! | `get-earnings` | principal |
//! | `get-accessible-contents` | user |

use serde::Serialize;
use serde_json::{json, Value};

use contentledger_core::{ContentId, ContentMetadata, Principal, ValidationError};
use contentledger_store::Store;

use crate::clock::Clock;
use crate::error::{ErrorCode, LedgerError, Result};
use crate::ledger::Ledger;

/// A parsed ledger call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    CreateContent { metadata: ContentMetadata },
    UpdateContent { id: ContentId, metadata: ContentMetadata },
    TransferContent { id: ContentId, new_owner: Principal },
    PurchaseContent { id: ContentId },
    SubscribeContent { id: ContentId },
    RecordRevenue { id: ContentId, amount: u64 },
    GetContent { id: ContentId },
    GetContentRevenue { id: ContentId },
    IsSubscribed { user: Principal, id: ContentId },
    GetEarnings { principal: Principal },
    GetAccessibleContents { user: Principal },
}

impl Request {
    /// Parse `method` and its positional `args`.
    ///
    /// Wrong arity, wrong types, negative numbers and out-of-range royalties
    /// are all validation errors.
    pub fn from_call(method: &str, args: &[Value]) -> Result<Self> {
        let args = Args { method, args };

        let request = match method {
            "create-content" => {
                args.expect_len(5)?;
                Request::CreateContent {
                    metadata: args.metadata(0)?,
                }
            }
            "update-content" => {
                args.expect_len(6)?;
                Request::UpdateContent {
                    id: args.content_id(0)?,
                    metadata: args.metadata(1)?,
                }
            }
            "transfer-content" => {
                args.expect_len(2)?;
                Request::TransferContent {
                    id: args.content_id(0)?,
                    new_owner: args.principal(1)?,
                }
            }
            "purchase-content" => {
                args.expect_len(1)?;
                Request::PurchaseContent {
                    id: args.content_id(0)?,
                }
            }
            "subscribe-content" => {
                args.expect_len(1)?;
                Request::SubscribeContent {
                    id: args.content_id(0)?,
                }
            }
            "record-revenue" => {
                args.expect_len(2)?;
                Request::RecordRevenue {
                    id: args.content_id(0)?,
                    amount: args.u64(1)?,
                }
            }
            "get-content" => {
                args.expect_len(1)?;
                Request::GetContent {
                    id: args.content_id(0)?,
                }
            }
            "get-content-revenue" => {
                args.expect_len(1)?;
                Request::GetContentRevenue {
                    id: args.content_id(0)?,
                }
            }
            "is-subscribed" => {
                args.expect_len(2)?;
                Request::IsSubscribed {
                    user: args.principal(0)?,
                    id: args.content_id(1)?,
                }
            }
            "get-earnings" => {
                args.expect_len(1)?;
                Request::GetEarnings {
                    principal: args.principal(0)?,
                }
            }
            "get-accessible-contents" => {
                args.expect_len(1)?;
                Request::GetAccessibleContents {
                    user: args.principal(0)?,
                }
            }
            other => {
                return Err(malformed(format!("unknown method {}", other)));
            }
        };

        Ok(request)
    }

    /// The method name this request was parsed from.
    pub fn method(&self) -> &'static str {
        match self {
            Request::CreateContent { .. } => "create-content",
            Request::UpdateContent { .. } => "update-content",
            Request::TransferContent { .. } => "transfer-content",
            Request::PurchaseContent { .. } => "purchase-content",
            Request::SubscribeContent { .. } => "subscribe-content",
            Request::RecordRevenue { .. } => "record-revenue",
            Request::GetContent { .. } => "get-content",
            Request::GetContentRevenue { .. } => "get-content-revenue",
            Request::IsSubscribed { .. } => "is-subscribed",
            Request::GetEarnings { .. } => "get-earnings",
            Request::GetAccessibleContents { .. } => "get-accessible-contents",
        }
    }
}

fn malformed(message: String) -> LedgerError {
    LedgerError::Validation(ValidationError::MalformedRequest(message))
}

/// Positional argument accessors.
struct Args<'a> {
    method: &'a str,
    args: &'a [Value],
}

impl Args<'_> {
    fn expect_len(&self, expected: usize) -> Result<()> {
        if self.args.len() != expected {
            return Err(malformed(format!(
                "{} takes {} arguments, got {}",
                self.method,
                expected,
                self.args.len()
            )));
        }
        Ok(())
    }

    fn get(&self, idx: usize) -> Result<&Value> {
        self.args
            .get(idx)
            .ok_or_else(|| malformed(format!("{}: missing argument {}", self.method, idx)))
    }

    fn u64(&self, idx: usize) -> Result<u64> {
        self.get(idx)?.as_u64().ok_or_else(|| {
            malformed(format!(
                "{}: argument {} must be a non-negative integer",
                self.method, idx
            ))
        })
    }

    fn str(&self, idx: usize) -> Result<&str> {
        self.get(idx)?
            .as_str()
            .ok_or_else(|| malformed(format!("{}: argument {} must be a string", self.method, idx)))
    }

    fn content_id(&self, idx: usize) -> Result<ContentId> {
        self.u64(idx).map(ContentId)
    }

    fn principal(&self, idx: usize) -> Result<Principal> {
        Ok(Principal::new(self.str(idx)?)?)
    }

    /// Five consecutive arguments: title, description, hash, price, royalty.
    fn metadata(&self, start: usize) -> Result<ContentMetadata> {
        let royalty = self.u64(start + 4)?;
        let price = self.u64(start + 3)?;
        Ok(ContentMetadata::new(
            self.str(start)?,
            self.str(start + 1)?,
            self.str(start + 2)?,
            price,
            royalty,
        )?)
    }
}

/// Tagged outcome of a call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Success { success: bool, value: Value },
    Failure { success: bool, error: ErrorCode },
}

impl Response {
    pub fn ok(value: Value) -> Self {
        Response::Success {
            success: true,
            value,
        }
    }

    pub fn err(code: ErrorCode) -> Self {
        Response::Failure {
            success: false,
            error: code,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success { .. })
    }

    /// The success value, if any.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Response::Success { value, .. } => Some(value),
            Response::Failure { .. } => None,
        }
    }

    /// The error code, if any.
    pub fn error(&self) -> Option<ErrorCode> {
        match self {
            Response::Success { .. } => None,
            Response::Failure { error, .. } => Some(*error),
        }
    }

    /// Serialize to the JSON wire shape.
    pub fn to_json(&self) -> Value {
        match self {
            Response::Success { value, .. } => json!({ "success": true, "value": value }),
            Response::Failure { error, .. } => json!({ "success": false, "error": error.as_u16() }),
        }
    }
}

impl<S: Store, C: Clock> Ledger<S, C> {
    /// Parse and run a call on behalf of `caller`.
    pub async fn call(&self, caller: &Principal, method: &str, args: &[Value]) -> Response {
        match Request::from_call(method, args) {
            Ok(request) => self.dispatch(caller, request).await,
            Err(err) => {
                tracing::warn!(method, caller = %caller, error = %err, "rejected call");
                Response::err(err.code())
            }
        }
    }

    /// Run a parsed request on behalf of `caller`.
    pub async fn dispatch(&self, caller: &Principal, request: Request) -> Response {
        let method = request.method();

        match self.execute(caller, request).await {
            Ok(value) => Response::ok(value),
            Err(err) => {
                tracing::warn!(method, caller = %caller, error = %err, "rejected call");
                Response::err(err.code())
            }
        }
    }

    async fn execute(&self, caller: &Principal, request: Request) -> Result<Value> {
        let value = match request {
            Request::CreateContent { metadata } => {
                let id = self.create_content(caller, metadata).await?;
                Value::from(id.get())
            }
            Request::UpdateContent { id, metadata } => {
                self.update_content(caller, id, metadata).await?;
                Value::Bool(true)
            }
            Request::TransferContent { id, new_owner } => {
                self.transfer_content(caller, id, &new_owner).await?;
                Value::Bool(true)
            }
            Request::PurchaseContent { id } => {
                self.purchase_content(caller, id).await?;
                Value::Bool(true)
            }
            Request::SubscribeContent { id } => {
                self.subscribe_content(caller, id).await?;
                Value::Bool(true)
            }
            Request::RecordRevenue { id, amount } => {
                self.record_revenue(caller, id, amount).await?;
                Value::Bool(true)
            }
            Request::GetContent { id } => to_value(&self.get_content(id).await?)?,
            Request::GetContentRevenue { id } => to_value(&self.get_content_revenue(id).await?)?,
            Request::IsSubscribed { user, id } => Value::Bool(self.is_subscribed(&user, id).await?),
            Request::GetEarnings { principal } => Value::from(self.earnings(&principal).await?),
            Request::GetAccessibleContents { user } => {
                to_value(&self.accessible_contents(&user).await?)?
            }
        };
        Ok(value)
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| {
        LedgerError::Encoding(contentledger_core::CoreError::EncodingError(e.to_string()))
    })
}
