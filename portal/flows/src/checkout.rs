//! # Checkout
//!
//! `SelectMethod (0) -> Confirm (1) -> Created (2)`, for both event registration and
//! the organizer upgrade. Only the first step is guarded; `back` never re-validates and
//! `Created` only leads out of the flow.
use api::{ApiError, PaymentService};
use async_trait::async_trait;
use models::{CreatePayment, Payment, PaymentMethod};
use thiserror::Error;
use tracing::{info, warn};

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment(&self, request: &CreatePayment) -> Result<Payment, ApiError>;
    async fn simulate_success(&self, invoice: &str) -> Result<Payment, ApiError>;
}

#[async_trait]
impl PaymentGateway for PaymentService {
    async fn create_payment(&self, request: &CreatePayment) -> Result<Payment, ApiError> {
        self.create(request).await
    }

    async fn simulate_success(&self, invoice: &str) -> Result<Payment, ApiError> {
        PaymentService::simulate_success(self, invoice).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    EventRegistration { event_id: u64 },
    OrganizerUpgrade,
}

impl Purpose {
    fn event_id(&self) -> Option<u64> {
        match self {
            Purpose::EventRegistration { event_id } => Some(*event_id),
            Purpose::OrganizerUpgrade => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutStep {
    SelectMethod,
    Confirm,
    Created(Payment),
}

impl CheckoutStep {
    pub fn index(&self) -> usize {
        match self {
            CheckoutStep::SelectMethod => 0,
            CheckoutStep::Confirm => 1,
            CheckoutStep::Created(_) => 2,
        }
    }
}

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Silakan pilih metode pembayaran")]
    MethodRequired,

    #[error("Langkah ini tidak tersedia saat ini")]
    InvalidStep,

    #[error("Simulasi pembayaran hanya tersedia pada mode pengembangan")]
    SimulationDisabled,

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone)]
pub struct CheckoutFlow {
    purpose: Purpose,
    step: CheckoutStep,
    method: Option<PaymentMethod>,
    channel: Option<String>,
    error: Option<String>,
    submitting: bool,
    dev_mode: bool,
}

impl CheckoutFlow {
    pub fn new(purpose: Purpose) -> Self {
        Self {
            purpose,
            step: CheckoutStep::SelectMethod,
            method: None,
            channel: None,
            error: None,
            submitting: false,
            dev_mode: false,
        }
    }

    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }

    pub fn purpose(&self) -> Purpose {
        self.purpose
    }

    pub fn step(&self) -> &CheckoutStep {
        &self.step
    }

    pub fn step_index(&self) -> usize {
        self.step.index()
    }

    pub fn method(&self) -> Option<PaymentMethod> {
        self.method
    }

    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    /// Message to show under the current step.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn payment(&self) -> Option<&Payment> {
        match &self.step {
            CheckoutStep::Created(payment) => Some(payment),
            _ => None,
        }
    }

    /// Picks a method; a previously chosen channel survives only if the new method
    /// accepts it, and single-channel methods select their channel directly.
    pub fn select_method(&mut self, method: PaymentMethod) -> Result<(), CheckoutError> {
        self.require(CheckoutStep::SelectMethod)?;

        if self.channel.as_deref().is_some_and(|channel| !method.accepts(channel)) {
            self.channel = None;
        }
        if let [only] = method.channels() {
            self.channel = Some(only.to_string());
        }

        self.method = Some(method);
        self.error = None;
        Ok(())
    }

    pub fn select_channel(&mut self, channel: &str) -> Result<(), CheckoutError> {
        self.require(CheckoutStep::SelectMethod)?;

        let channel = channel.trim().to_lowercase();
        match self.method {
            Some(method) if method.accepts(&channel) => {
                self.channel = Some(channel);
                self.error = None;
                Ok(())
            }
            _ => Err(self.fail(CheckoutError::MethodRequired)),
        }
    }

    pub fn next(&mut self) -> Result<(), CheckoutError> {
        self.require(CheckoutStep::SelectMethod)?;

        if self.request().is_none() {
            return Err(self.fail(CheckoutError::MethodRequired));
        }

        self.error = None;
        self.step = CheckoutStep::Confirm;
        Ok(())
    }

    /// One step back from `Confirm`; returns whether the step changed.
    pub fn back(&mut self) -> bool {
        if self.step != CheckoutStep::Confirm || self.submitting {
            return false;
        }

        self.error = None;
        self.step = CheckoutStep::SelectMethod;
        true
    }

    /// Body for `POST /payments`, once both method and channel are chosen.
    pub fn request(&self) -> Option<CreatePayment> {
        let method = self.method?;
        let channel = self.channel.as_ref().filter(|channel| method.accepts(channel))?;

        Some(CreatePayment {
            event_id: self.purpose.event_id(),
            payment_method: method,
            payment_channel: channel.clone(),
        })
    }

    /// Creates the payment from `Confirm`. On failure the flow stays on `Confirm`
    /// with the server message.
    pub async fn submit<G>(&mut self, gateway: &G) -> Result<&Payment, CheckoutError>
    where
        G: PaymentGateway + ?Sized,
    {
        self.require(CheckoutStep::Confirm)?;
        let request = self.request().ok_or(CheckoutError::MethodRequired)?;

        self.submitting = true;
        self.error = None;
        let result = gateway.create_payment(&request).await;
        self.submitting = false;

        match result {
            Ok(payment) => {
                info!("Checkout created {}", payment.invoice_number);
                self.step = CheckoutStep::Created(payment);

                self.payment().ok_or(CheckoutError::InvalidStep)
            }
            Err(e) => {
                warn!("Checkout failed: {e}");
                Err(self.fail(CheckoutError::Api(e)))
            }
        }
    }

    /// Developer shortcut that confirms the created payment without a provider.
    pub async fn simulate_success<G>(&mut self, gateway: &G) -> Result<&Payment, CheckoutError>
    where
        G: PaymentGateway + ?Sized,
    {
        if !self.dev_mode {
            return Err(self.fail(CheckoutError::SimulationDisabled));
        }

        let invoice = self
            .payment()
            .map(|payment| payment.invoice_number.clone())
            .ok_or(CheckoutError::InvalidStep)?;

        self.submitting = true;
        let result = gateway.simulate_success(&invoice).await;
        self.submitting = false;

        match result {
            Ok(payment) => {
                info!("Simulated payment {invoice}");
                self.error = None;
                self.step = CheckoutStep::Created(payment);

                self.payment().ok_or(CheckoutError::InvalidStep)
            }
            Err(e) => Err(self.fail(CheckoutError::Api(e))),
        }
    }

    fn require(&self, step: CheckoutStep) -> Result<(), CheckoutError> {
        if std::mem::discriminant(&self.step) == std::mem::discriminant(&step) {
            Ok(())
        } else {
            Err(CheckoutError::InvalidStep)
        }
    }

    fn fail(&mut self, error: CheckoutError) -> CheckoutError {
        self.error = Some(error.to_string());
        error
    }
}
