// storefront/src/pipelines/contexts.rs

//! Context data carried through each pipeline. Handlers receive these
//! wrapped in `shopflow::ContextData`.

use crate::models::{CartItem, CartOwner, CartView, CheckoutView, NewCheckoutLine, OrderView, Product, ShippingAddress, User, UserRole};
use crate::state::AppState;
use uuid::Uuid;

#[derive(Clone)]
pub struct SignupCtxData {
  pub app_state: AppState,
  pub name: String,
  pub email: String,
  pub password: String,
  pub role: UserRole,
  /// Admin-created accounts do not get a session token.
  pub issue_session: bool,
  pub created_user: Option<User>,
  pub token: Option<String>,
  pub welcome_email_sent: bool,
}

impl SignupCtxData {
  pub fn new(app_state: AppState, name: String, email: String, password: String) -> Self {
    Self {
      app_state,
      name,
      email,
      password,
      role: UserRole::Customer,
      issue_session: true,
      created_user: None,
      token: None,
      welcome_email_sent: false,
    }
  }
}

#[derive(Clone)]
pub struct SigninCtxData {
  pub app_state: AppState,
  pub email: String,
  pub password: String,
  pub user: Option<User>,
  pub token: Option<String>,
}

#[derive(Clone)]
pub struct AddToCartCtxData {
  pub app_state: AppState,
  pub owner: CartOwner,
  pub product_id: Uuid,
  pub quantity: i32,
  pub size: String,
  pub color: String,
  pub product: Option<Product>,
  pub cart: Option<CartView>,
}

#[derive(Clone)]
pub struct CreateCheckoutCtxData {
  pub app_state: AppState,
  pub user_id: Uuid,
  pub shipping_address: ShippingAddress,
  pub payment_method: String,
  pub cart_items: Vec<CartItem>,
  pub lines: Vec<NewCheckoutLine>,
  pub currency: Option<String>,
  pub checkout: Option<CheckoutView>,
}

#[derive(Clone)]
pub struct FinalizeCheckoutCtxData {
  pub app_state: AppState,
  pub user_id: Uuid,
  pub checkout_id: Uuid,
  pub checkout: Option<CheckoutView>,
  /// Loaded with the checkout so the confirmation step needs no query.
  pub customer: Option<User>,
  pub order: Option<OrderView>,
  pub confirmation_email_sent: bool,
}

impl FinalizeCheckoutCtxData {
  pub fn new(app_state: AppState, user_id: Uuid, checkout_id: Uuid) -> Self {
    Self {
      app_state,
      user_id,
      checkout_id,
      checkout: None,
      customer: None,
      order: None,
      confirmation_email_sent: false,
    }
  }
}

#[derive(Clone)]
pub struct SendWelcomeEmailCtxData {
  pub app_state: AppState,
  pub recipient_email: String,
  pub recipient_name: String,
}

#[derive(Clone)]
pub struct SendOrderConfirmationEmailCtxData {
  pub app_state: AppState,
  pub recipient_email: String,
  pub recipient_name: String,
  pub order_id: Uuid,
  pub order_total_display: String,
}
