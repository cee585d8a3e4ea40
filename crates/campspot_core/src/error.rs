use std::fmt;

/// Kind of record a [`CoreError::NotFound`] refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    /// A user account
    User,
    /// A campspot
    Spot,
    /// A location that groups spots
    Location,
    /// A booking
    Booking,
    /// An amenity attached to a spot
    Amenity,
    /// A review of a spot
    Review,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::User => "user",
            Entity::Spot => "spot",
            Entity::Location => "location",
            Entity::Booking => "booking",
            Entity::Amenity => "amenity",
            Entity::Review => "review",
        };
        f.write_str(name)
    }
}

/// Why a [`CoreError::Conflict`] was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// An active booking already covers part of the requested dates
    Overlap,
    /// The spot already lists an amenity with this name
    DuplicateAmenity,
    /// The author has already reviewed this spot
    DuplicateReview,
    /// The location still has spots attached
    LocationInUse,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            ConflictKind::Overlap => "overlapping booking",
            ConflictKind::DuplicateAmenity => "duplicate amenity",
            ConflictKind::DuplicateReview => "duplicate review",
            ConflictKind::LocationInUse => "location in use",
        };
        f.write_str(reason)
    }
}

/// Why a [`CoreError::Forbidden`] was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenReason {
    /// The caller does not own the spot or location being changed
    NotOwner,
    /// The caller does not own the review being changed
    NotAuthor,
    /// The renter owns the spot they tried to book
    SelfBooking,
    /// The booking is already confirmed or cancelled
    TerminalStatus,
    /// The requested target status is not reachable from the current one
    IllegalTransition,
}

impl fmt::Display for ForbiddenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            ForbiddenReason::NotOwner => "not owner",
            ForbiddenReason::NotAuthor => "not author",
            ForbiddenReason::SelfBooking => "self booking",
            ForbiddenReason::TerminalStatus => "terminal status",
            ForbiddenReason::IllegalTransition => "illegal transition",
        };
        f.write_str(reason)
    }
}

/// Error type shared by all core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The referenced record does not exist
    #[error("{0} not found")]
    NotFound(Entity),

    /// The operation would violate a uniqueness or exclusion rule
    #[error("conflict: {0}")]
    Conflict(ConflictKind),

    /// The caller is not allowed to perform the operation
    #[error("forbidden: {0}")]
    Forbidden(ForbiddenReason),

    /// The date range does not cover at least one night
    #[error("invalid date range: end date must be after start date")]
    InvalidRange,

    /// Request data failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;
