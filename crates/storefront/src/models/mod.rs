//! Domain models for the storefront.
//!
//! Models are the typed shape of database rows. Computed attributes (current
//! price, full address, totals) are explicit methods.

pub mod booking;
pub mod cart;
pub mod catalog;
pub mod customer;
pub mod discount;
pub mod event;
pub mod order;
pub mod session;
pub mod verification;

pub use booking::LandscapeBooking;
pub use cart::{Cart, CartItem, CartView};
pub use catalog::{Category, Color, Occasion, Product, ProductAttribute, ProductDetail, Size};
pub use customer::{Address, Customer};
pub use discount::Discount;
pub use event::Event;
pub use order::{Order, OrderDetail, OrderItem, Payment};
pub use session::{CurrentCustomer, keys as session_keys};
pub use verification::VerificationRequest;
