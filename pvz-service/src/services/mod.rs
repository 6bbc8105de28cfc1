pub mod database;
pub mod jwt;
pub mod metrics;
mod product;
mod pvz;
mod reception;
mod user;

pub use database::Database;
pub use jwt::{Claims, JwtService};
pub use metrics::{get_metrics, init_metrics};
pub use product::ProductService;
pub use pvz::PvzService;
pub use reception::ReceptionService;
pub use user::UserService;
