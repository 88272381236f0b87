//! Self-checkout
//!
//! Client core of a retail self-checkout: scan products into a durable local
//! cart, turn the cart into a payable invoice, and watch the invoice until a
//! store official marks it paid.

pub mod api;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod ids;
pub mod invoices;
pub mod official;
pub mod poller;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod receipt;
pub mod scan;
pub mod session;
pub mod storage;
