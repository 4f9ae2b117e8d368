use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single user-initiated payment. Immutable once submitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount: f64,
    pub memo: String,
    /// Opaque key-value pairs forwarded to the SDK untouched.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Why a payment request was refused before anything left the process.
#[derive(Clone, Debug, PartialEq)]
pub enum PaymentRequestError {
    InvalidAmount(String),
    NonPositiveAmount,
}

impl fmt::Display for PaymentRequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAmount(raw) => write!(f, "invalid payment amount: {raw:?}"),
            Self::NonPositiveAmount => write!(f, "payment amount must be greater than zero"),
        }
    }
}

impl std::error::Error for PaymentRequestError {}

impl PaymentRequest {
    pub fn new(amount: f64, memo: impl Into<String>) -> Self {
        Self {
            amount,
            memo: memo.into(),
            metadata: Map::new(),
        }
    }

    /// Parse the amount as typed into a form field.
    pub fn parse(amount: &str, memo: &str) -> Result<Self, PaymentRequestError> {
        let parsed: f64 = amount
            .trim()
            .parse()
            .map_err(|_| PaymentRequestError::InvalidAmount(amount.to_string()))?;
        let request = Self::new(parsed, memo);
        request.validate()?;
        Ok(request)
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn validate(&self) -> Result<(), PaymentRequestError> {
        if !self.amount.is_finite() {
            return Err(PaymentRequestError::InvalidAmount(self.amount.to_string()));
        }
        if self.amount <= 0.0 {
            return Err(PaymentRequestError::NonPositiveAmount);
        }
        Ok(())
    }
}

/// Lifecycle of one payment. Moves forward only; the last three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentState {
    Created,
    PendingApproval,
    Approved,
    PendingCompletion,
    Completed,
    Cancelled,
    Failed,
}

impl PaymentState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PaymentState::Completed | PaymentState::Cancelled | PaymentState::Failed
        )
    }

    /// Returns true if transitioning from self to `next` is valid.
    pub fn can_transition_to(self, next: PaymentState) -> bool {
        use PaymentState::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Created, PendingApproval)
                | (PendingApproval, Approved)
                // approval relay failures are tolerated; the SDK may still
                // hand us a transaction
                | (PendingApproval, PendingCompletion)
                | (Approved, PendingCompletion)
                | (PendingCompletion, Completed)
                | (_, Cancelled)
                | (_, Failed)
        )
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Named events that drive a [`PaymentLifecycleRecord`].
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentEvent {
    /// SDK callback: the payment exists and awaits server approval.
    ReadyForApproval,
    /// The provider accepted our approve call.
    ServerApproved,
    /// SDK callback: the transaction was submitted and awaits completion.
    ReadyForCompletion { transaction_id: String },
    /// The provider accepted our complete call.
    ServerCompleted,
    Cancelled,
    Failed { reason: String },
}

impl PaymentEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReadyForApproval => "ready_for_approval",
            Self::ServerApproved => "server_approved",
            Self::ReadyForCompletion { .. } => "ready_for_completion",
            Self::ServerCompleted => "server_completed",
            Self::Cancelled => "cancelled",
            Self::Failed { .. } => "failed",
        }
    }

    fn target(&self) -> PaymentState {
        match self {
            Self::ReadyForApproval => PaymentState::PendingApproval,
            Self::ServerApproved => PaymentState::Approved,
            Self::ReadyForCompletion { .. } => PaymentState::PendingCompletion,
            Self::ServerCompleted => PaymentState::Completed,
            Self::Cancelled => PaymentState::Cancelled,
            Self::Failed { .. } => PaymentState::Failed,
        }
    }
}

/// An event arrived that the current state does not accept.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionError {
    pub payment_id: String,
    pub from: PaymentState,
    pub event: &'static str,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "payment {}: event {} not allowed in state {}",
            self.payment_id, self.event, self.from
        )
    }
}

impl std::error::Error for TransitionError {}

/// Tracks one payment from the moment the SDK hands back its identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentLifecycleRecord {
    pub payment_id: String,
    pub transaction_id: Option<String>,
    state: PaymentState,
    failure: Option<String>,
}

impl PaymentLifecycleRecord {
    pub fn new(payment_id: impl Into<String>) -> Self {
        Self {
            payment_id: payment_id.into(),
            transaction_id: None,
            state: PaymentState::Created,
            failure: None,
        }
    }

    pub fn state(&self) -> PaymentState {
        self.state
    }

    /// Reason recorded by the `Failed` event, if any.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Apply an event, returning the new state. Rejected events leave the
    /// record untouched.
    pub fn apply(&mut self, event: PaymentEvent) -> Result<PaymentState, TransitionError> {
        let next = event.target();
        if !self.state.can_transition_to(next) {
            return Err(TransitionError {
                payment_id: self.payment_id.clone(),
                from: self.state,
                event: event.name(),
            });
        }
        match event {
            PaymentEvent::ReadyForCompletion { transaction_id } => {
                self.transaction_id = Some(transaction_id);
            }
            PaymentEvent::Failed { reason } => self.failure = Some(reason),
            _ => {}
        }
        self.state = next;
        Ok(next)
    }
}
