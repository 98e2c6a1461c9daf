//! Delivery lifecycle states and the ordering used to forbid regression.

use serde::{Deserialize, Serialize};

/// Delivery status of an order.
///
/// The store persists the Italian labels (`as_label`), which form a closed
/// vocabulary shared with every automated writer. Ranks define a total order:
/// automated updates may only move an order to an equal or higher rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Pending,
    Problem,
    Shipped,
    InTransit,
    OutForDelivery,
    Delivered,
    Refunded,
    Cancelled,
}

impl Status {
    /// Label stored in the database and shown to the user.
    pub fn as_label(&self) -> &'static str {
        match self {
            Status::Pending => "In Attesa",
            Status::Problem => "Problema/Eccezione",
            Status::Shipped => "Spedito",
            Status::InTransit => "In Transito",
            Status::OutForDelivery => "In Consegna",
            Status::Delivered => "Consegnato",
            Status::Refunded => "Rimborsato",
            Status::Cancelled => "Annullato",
        }
    }

    /// Parse a stored label back into a status.
    pub fn from_label(label: &str) -> Option<Status> {
        match label.trim() {
            "In Attesa" => Some(Status::Pending),
            "Problema/Eccezione" => Some(Status::Problem),
            "Spedito" => Some(Status::Shipped),
            "In Transito" => Some(Status::InTransit),
            "In Consegna" => Some(Status::OutForDelivery),
            "Consegnato" => Some(Status::Delivered),
            "Rimborsato" => Some(Status::Refunded),
            "Annullato" => Some(Status::Cancelled),
            _ => None,
        }
    }

    /// Position in the lifecycle. Higher = more advanced.
    ///
    /// Refunded and Cancelled share the terminal rank with Delivered so that
    /// a stale carrier email can never reopen a closed order.
    pub fn rank(&self) -> u8 {
        match self {
            Status::Pending => 0,
            Status::Problem => 1,
            Status::Shipped => 2,
            Status::InTransit => 3,
            Status::OutForDelivery => 4,
            Status::Delivered | Status::Refunded | Status::Cancelled => 5,
        }
    }

    /// Whether the order has reached the end of its lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Delivered | Status::Refunded | Status::Cancelled)
    }

    /// True iff `candidate` is an equal or more advanced state than `current`.
    ///
    /// A missing candidate never upgrades; a missing current status counts as
    /// `Pending`. This is the single gate every automated writer goes
    /// through, so an order can never move backward from a stale signal.
    pub fn is_upgrade(current: Option<Status>, candidate: Option<Status>) -> bool {
        let Some(candidate) = candidate else {
            return false;
        };
        let current_rank = current.unwrap_or(Status::Pending).rank();
        candidate.rank() >= current_rank
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Pending
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}
