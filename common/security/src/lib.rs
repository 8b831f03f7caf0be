pub mod context;
pub mod error;
pub mod test_macros;

pub use context::{attach_merchant_context, MerchantContext, MerchantHeader, MerchantId};
pub use error::SecurityError;
