// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! External providers: payments, email, banking board and invoice rendering.
//!
//! Services only see the traits below. Two implementations ship with the
//! crate: offline providers that log what they would have done, and
//! recording providers that keep every call in memory for inspection.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::info;

/// Failure reported by an external provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrationError {
    /// The provider refused or failed the call.
    Rejected {
        /// The provider name.
        service: String,
        /// The provider's message.
        message: String,
    },
    /// The configured provider cannot perform this operation.
    Unsupported {
        /// The provider name.
        service: String,
        /// The operation that was requested.
        operation: String,
    },
}

impl std::fmt::Display for IntegrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected { service, message } => write!(f, "{service} rejected: {message}"),
            Self::Unsupported { service, operation } => {
                write!(f, "{service} does not support {operation}")
            }
        }
    }
}

impl std::error::Error for IntegrationError {}

/// A stored payment method of a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodSummary {
    pub id: String,
    pub brand: String,
    pub last4: String,
    pub exp_month: u8,
    pub exp_year: u16,
}

/// Payment provider operations.
pub trait PaymentProvider: Send + Sync {
    /// Registers a customer and returns its reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider rejects the customer.
    fn create_customer(&self, email: &str, name: &str) -> Result<String, IntegrationError>;

    /// Lists the stored payment methods of a customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails.
    fn list_payment_methods(
        &self,
        customer_id: &str,
    ) -> Result<Vec<PaymentMethodSummary>, IntegrationError>;

    /// Creates a payment intent and returns its reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider rejects the intent.
    fn create_payment_intent(
        &self,
        customer_id: &str,
        amount: i64,
        payment_method_id: Option<&str>,
    ) -> Result<String, IntegrationError>;

    /// Confirms a payment intent.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment is declined.
    fn confirm_payment_intent(&self, intent_id: &str) -> Result<(), IntegrationError>;

    /// Charges a customer off-session and returns the charge reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the charge is declined.
    fn charge(
        &self,
        customer_id: &str,
        amount: i64,
        description: &str,
    ) -> Result<String, IntegrationError>;
}

/// Email templates known to the notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmailTemplate {
    Welcome,
    CommandConfirmation,
    CommandReady,
    Invoice,
    BankTransfer,
}

impl EmailTemplate {
    /// Returns the template identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::CommandConfirmation => "command-confirmation",
            Self::CommandReady => "command-ready",
            Self::Invoice => "invoice",
            Self::BankTransfer => "bank-transfer",
        }
    }
}

/// A file attached to an email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
}

/// A templated email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub template: EmailTemplate,
    /// Named values substituted into the template.
    pub variables: BTreeMap<String, String>,
    pub attachment: Option<Attachment>,
}

impl EmailMessage {
    /// Creates a message without variables or attachment.
    #[must_use]
    pub fn new(to: &str, template: EmailTemplate) -> Self {
        Self {
            to: to.to_string(),
            template,
            variables: BTreeMap::new(),
            attachment: None,
        }
    }

    /// Adds a template variable.
    #[must_use]
    pub fn with_variable(mut self, name: &str, value: impl Into<String>) -> Self {
        self.variables.insert(name.to_string(), value.into());
        self
    }

    /// Attaches a file.
    #[must_use]
    pub fn with_attachment(mut self, filename: &str, content: Vec<u8>) -> Self {
        self.attachment = Some(Attachment {
            filename: filename.to_string(),
            content,
        });
        self
    }
}

/// Email delivery.
pub trait Notifier: Send + Sync {
    /// Sends a templated email.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails.
    fn send(&self, message: &EmailMessage) -> Result<(), IntegrationError>;
}

/// A pending bank transfer posted to the banking board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferCard {
    pub commerce_name: String,
    pub holder: String,
    pub iban: String,
    pub bic: String,
    /// Amount in minor currency units.
    pub amount: i64,
}

/// Board where manual bank transfers are tracked.
pub trait BankingBoard: Send + Sync {
    /// Creates a card for a transfer and returns its reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the board rejects the card.
    fn create_card(&self, card: &TransferCard) -> Result<String, IntegrationError>;
}

/// One billed line of an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceLine {
    pub label: String,
    pub amount: i64,
}

/// Data rendered into an invoice document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub commerce_name: String,
    pub billed_on: String,
    pub lines: Vec<InvoiceLine>,
    pub total: i64,
}

/// Invoice document rendering.
pub trait InvoiceRenderer: Send + Sync {
    /// Renders an invoice into PDF bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&self, invoice: &Invoice) -> Result<Vec<u8>, IntegrationError>;
}

/// The set of providers injected into the services.
#[derive(Clone)]
pub struct Integrations {
    pub payments: Arc<dyn PaymentProvider>,
    pub notifier: Arc<dyn Notifier>,
    pub banking_board: Arc<dyn BankingBoard>,
    pub invoices: Arc<dyn InvoiceRenderer>,
}

impl Integrations {
    /// Providers that log instead of calling out.
    #[must_use]
    pub fn offline() -> Self {
        Self {
            payments: Arc::new(OfflinePayments::default()),
            notifier: Arc::new(LogNotifier),
            banking_board: Arc::new(LogBankingBoard::default()),
            invoices: Arc::new(PlainTextInvoices),
        }
    }
}

impl std::fmt::Debug for Integrations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Integrations").finish_non_exhaustive()
    }
}

// ============================================================================
// Offline providers
// ============================================================================

/// Payment provider used when no real provider is configured.
///
/// Customers and charges receive local references; card payments at
/// checkout are refused.
#[derive(Debug, Default)]
pub struct OfflinePayments {
    counter: AtomicU64,
}

impl OfflinePayments {
    fn next_reference(&self, prefix: &str) -> String {
        let n: u64 = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{prefix}_offline_{n}")
    }
}

impl PaymentProvider for OfflinePayments {
    fn create_customer(&self, email: &str, _name: &str) -> Result<String, IntegrationError> {
        let customer_id: String = self.next_reference("cus");
        info!(email = %email, customer_id = %customer_id, "Offline customer created");
        Ok(customer_id)
    }

    fn list_payment_methods(
        &self,
        _customer_id: &str,
    ) -> Result<Vec<PaymentMethodSummary>, IntegrationError> {
        Ok(Vec::new())
    }

    fn create_payment_intent(
        &self,
        _customer_id: &str,
        _amount: i64,
        _payment_method_id: Option<&str>,
    ) -> Result<String, IntegrationError> {
        Err(IntegrationError::Unsupported {
            service: String::from("payments"),
            operation: String::from("card payment"),
        })
    }

    fn confirm_payment_intent(&self, _intent_id: &str) -> Result<(), IntegrationError> {
        Err(IntegrationError::Unsupported {
            service: String::from("payments"),
            operation: String::from("card payment"),
        })
    }

    fn charge(
        &self,
        customer_id: &str,
        amount: i64,
        description: &str,
    ) -> Result<String, IntegrationError> {
        let charge_id: String = self.next_reference("ch");
        info!(
            customer_id = %customer_id,
            amount,
            description = %description,
            charge_id = %charge_id,
            "Offline charge recorded"
        );
        Ok(charge_id)
    }
}

/// Notifier that logs every email.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, message: &EmailMessage) -> Result<(), IntegrationError> {
        info!(
            to = %message.to,
            template = message.template.as_str(),
            attachment = message.attachment.as_ref().map(|a| a.filename.as_str()),
            "Email not sent (offline)"
        );
        Ok(())
    }
}

/// Banking board that logs every card.
#[derive(Debug, Default)]
pub struct LogBankingBoard {
    counter: AtomicU64,
}

impl BankingBoard for LogBankingBoard {
    fn create_card(&self, card: &TransferCard) -> Result<String, IntegrationError> {
        let n: u64 = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            commerce = %card.commerce_name,
            amount = card.amount,
            "Transfer card logged (offline)"
        );
        Ok(format!("card_offline_{n}"))
    }
}

/// Renders invoices as plain text.
#[derive(Debug, Default)]
pub struct PlainTextInvoices;

impl InvoiceRenderer for PlainTextInvoices {
    fn render(&self, invoice: &Invoice) -> Result<Vec<u8>, IntegrationError> {
        let mut text: String = format!(
            "Invoice for {}\nBilled on {}\n\n",
            invoice.commerce_name, invoice.billed_on
        );
        for line in &invoice.lines {
            text.push_str(&format!("{}\t{}\n", line.label, format_amount(line.amount)));
        }
        text.push_str(&format!("\nTotal\t{}\n", format_amount(invoice.total)));
        Ok(text.into_bytes())
    }
}

/// Formats minor currency units with two decimals.
#[must_use]
pub fn format_amount(amount: i64) -> String {
    let sign: &str = if amount < 0 { "-" } else { "" };
    let abs: i64 = amount.abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

// ============================================================================
// Recording providers
// ============================================================================

/// A call observed by a recording provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    CreateCustomer { email: String },
    CreatePaymentIntent { customer_id: String, amount: i64 },
    ConfirmPaymentIntent { intent_id: String },
    Charge { customer_id: String, amount: i64 },
    Email { to: String, template: EmailTemplate },
    TransferCard { commerce_name: String, amount: i64 },
    RenderInvoice { commerce_name: String, total: i64 },
}

#[derive(Debug, Default)]
struct RecorderState {
    calls: Vec<RecordedCall>,
    payment_methods: Vec<PaymentMethodSummary>,
    decline_payments: bool,
    fail_emails: bool,
}

/// In-memory providers that record every call.
///
/// One recorder backs all four provider traits so a test can inspect the
/// exact order of external calls.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    state: Arc<Mutex<RecorderState>>,
}

impl Recorder {
    /// Creates a recorder that accepts every call.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns integrations backed by this recorder.
    #[must_use]
    pub fn integrations(&self) -> Integrations {
        Integrations {
            payments: Arc::new(self.clone()),
            notifier: Arc::new(self.clone()),
            banking_board: Arc::new(self.clone()),
            invoices: Arc::new(self.clone()),
        }
    }

    /// Returns every call recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Makes payment intents and charges fail.
    pub fn decline_payments(&self, decline: bool) {
        self.lock().decline_payments = decline;
    }

    /// Makes email delivery fail.
    pub fn fail_emails(&self, fail: bool) {
        self.lock().fail_emails = fail;
    }

    /// Sets the payment methods returned for any customer.
    pub fn set_payment_methods(&self, methods: Vec<PaymentMethodSummary>) {
        self.lock().payment_methods = methods;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: RecordedCall) -> usize {
        let mut state = self.lock();
        state.calls.push(call);
        state.calls.len()
    }

    fn declined(service: &str) -> IntegrationError {
        IntegrationError::Rejected {
            service: service.to_string(),
            message: String::from("declined"),
        }
    }
}

impl PaymentProvider for Recorder {
    fn create_customer(&self, email: &str, _name: &str) -> Result<String, IntegrationError> {
        let n: usize = self.record(RecordedCall::CreateCustomer {
            email: email.to_string(),
        });
        Ok(format!("cus_test_{n}"))
    }

    fn list_payment_methods(
        &self,
        _customer_id: &str,
    ) -> Result<Vec<PaymentMethodSummary>, IntegrationError> {
        Ok(self.lock().payment_methods.clone())
    }

    fn create_payment_intent(
        &self,
        customer_id: &str,
        amount: i64,
        _payment_method_id: Option<&str>,
    ) -> Result<String, IntegrationError> {
        let n: usize = self.record(RecordedCall::CreatePaymentIntent {
            customer_id: customer_id.to_string(),
            amount,
        });
        if self.lock().decline_payments {
            return Err(Self::declined("payments"));
        }
        Ok(format!("pi_test_{n}"))
    }

    fn confirm_payment_intent(&self, intent_id: &str) -> Result<(), IntegrationError> {
        self.record(RecordedCall::ConfirmPaymentIntent {
            intent_id: intent_id.to_string(),
        });
        Ok(())
    }

    fn charge(
        &self,
        customer_id: &str,
        amount: i64,
        _description: &str,
    ) -> Result<String, IntegrationError> {
        let n: usize = self.record(RecordedCall::Charge {
            customer_id: customer_id.to_string(),
            amount,
        });
        if self.lock().decline_payments {
            return Err(Self::declined("payments"));
        }
        Ok(format!("ch_test_{n}"))
    }
}

impl Notifier for Recorder {
    fn send(&self, message: &EmailMessage) -> Result<(), IntegrationError> {
        self.record(RecordedCall::Email {
            to: message.to.clone(),
            template: message.template,
        });
        if self.lock().fail_emails {
            return Err(IntegrationError::Rejected {
                service: String::from("email"),
                message: String::from("mailbox unavailable"),
            });
        }
        Ok(())
    }
}

impl BankingBoard for Recorder {
    fn create_card(&self, card: &TransferCard) -> Result<String, IntegrationError> {
        let n: usize = self.record(RecordedCall::TransferCard {
            commerce_name: card.commerce_name.clone(),
            amount: card.amount,
        });
        Ok(format!("card_test_{n}"))
    }
}

impl InvoiceRenderer for Recorder {
    fn render(&self, invoice: &Invoice) -> Result<Vec<u8>, IntegrationError> {
        self.record(RecordedCall::RenderInvoice {
            commerce_name: invoice.commerce_name.clone(),
            total: invoice.total,
        });
        PlainTextInvoices.render(invoice)
    }
}
