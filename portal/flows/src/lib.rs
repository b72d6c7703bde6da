//! # Portal Flows
//!
//! Stateful client logic on top of the API adapters.
//!
//! ## Payment Status Polling
//!
//! [`PaymentPoller`] owns a single tokio task per invoice.
//! - One fetch on start and one per manual refresh
//! - While the status is `pending` and auto-refresh is on, fetch again after the poll
//!   interval (5 seconds by default)
//! - `success`, `failed` and `expired` are final: the task publishes them and exits
//! - Fetch errors are published next to the last known payment and polling carries on
//! - Fetches never overlap, a refresh that arrives mid-fetch is served by that fetch
//! - Dropping the handle cancels the timer
//!
//! Snapshots are read through a `watch` receiver, so a caller can render on every change
//! or just wait for [`PaymentPoller::settled`].
//!
//! ## Checkout
//!
//! [`CheckoutFlow`] walks `SelectMethod -> Confirm -> Created` for event registrations and
//! organizer upgrades.
//! - `next` needs a method and a channel that method accepts
//! - `back` only from `Confirm`
//! - `submit` failures keep the flow on `Confirm` with the server message
//! - `simulate_success` needs developer mode and a created payment
//!
//! ## Forms
//!
//! Password, reset, forgot-password and profile forms validate locally before anything is
//! sent. The password checklist has five independent rules and the submit button is
//! enabled only when all of them hold and the confirmation matches.

pub mod checkout;
pub mod forms;
pub mod poll;

pub use checkout::{CheckoutError, CheckoutFlow, CheckoutStep, PaymentGateway, Purpose};
pub use forms::{
    ChangePasswordForm, FormErrors, FormState, ForgotPasswordForm, PasswordChecklist,
    ProfileForm, ResetPasswordForm, Submission,
};
pub use poll::{PaymentPoller, PollConfig, PollSnapshot, StatusSource};
