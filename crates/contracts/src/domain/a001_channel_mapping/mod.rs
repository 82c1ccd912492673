pub mod aggregate;
pub mod cash_form;

pub use aggregate::{
    compose_order_number, ChannelMapping, DeliveryMapping, MappingEdit, MappingSettings,
    PaymentMapping,
};
pub use cash_form::is_cash_payment_form;
