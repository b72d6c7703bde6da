//! # Models
//!
//! Records exchanged with the Acara backend and the pure lookups used to render them.
//!
//! Nothing here performs I/O. The `api` crate decodes responses into these types and
//! every front end renders them through the same presentation tables, so the same
//! payload always renders the same way.

pub mod auth;
pub mod certificate;
pub mod currency;
pub mod envelope;
pub mod event;
pub mod payment;
pub mod user;

pub use auth::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, ProfileUpdate,
    ResetPasswordRequest,
};
pub use certificate::{Certificate, CertificateAction};
pub use currency::format_rupiah;
pub use envelope::{Envelope, EnvelopeError, EnvelopeStatus};
pub use event::{EventData, EventStatus};
pub use payment::{
    CreatePayment, Payment, PaymentMethod, PaymentStatus, StatusColor, StatusPresentation,
};
pub use user::{AuthToken, Role, User};
