//! Persistent storage model.
//!
//! One canonical sea-orm entity per concept; request/response shapes live in
//! [`crate::dto`].

pub mod cart_item;
pub mod courier;
pub mod order;
pub mod order_cart_item;
pub mod product;
pub mod promo;
pub mod promo_redemption;
pub mod user;
pub mod user_group;
pub mod user_location;

pub use cart_item::Entity as CartItem;
pub use courier::Entity as Courier;
pub use order::Entity as Order;
pub use order_cart_item::Entity as OrderCartItem;
pub use product::Entity as Product;
pub use promo::Entity as Promo;
pub use promo_redemption::Entity as PromoRedemption;
pub use user::Entity as User;
pub use user_group::Entity as UserGroup;
pub use user_location::Entity as UserLocation;
