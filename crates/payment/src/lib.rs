//! Iyzico payments.
//!
//! [`IyzicoClient`] signs and sends gateway requests; [`CheckoutService`]
//! ties them to stored orders:
//!
//! ```text
//! initiate ──► gateway token stored on order ──► customer pays on hosted form
//!                                                        │
//!                      callback(token) ◄─────────────────┘
//!                          │
//!          SUCCESS ──► Pending → Processing
//!          otherwise ─► Pending → Cancelled
//! ```

pub mod checkout;
pub mod config;
pub mod error;
pub mod gateway;
pub mod signature;
pub mod types;

pub use checkout::{
    CallbackOutcome, CheckoutService, FALLBACK_CLIENT_IP, PAYMENT_METHOD_IYZICO,
    build_checkout_request,
};
pub use config::IyzicoConfig;
pub use error::{PaymentError, Result};
pub use gateway::{GatewayCall, InMemoryPaymentGateway, IyzicoClient, PaymentGateway};
pub use types::{
    CancelRequest, CheckoutFormInitialized, CheckoutFormRequest, CheckoutFormResult,
    RefundRequest,
};
