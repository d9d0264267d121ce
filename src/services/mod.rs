// Business logic layer

pub mod convomat;
pub mod notification;
pub mod order;
pub mod tenant;
pub mod user_directory;

pub use convomat::{ConvomatError, ConvomatService};
pub use notification::{NotificationError, NotificationService};
pub use order::{review_eligibility, OrderService};
pub use tenant::identify_tenant;
pub use user_directory::{list_admins, list_customers, AdminPage, CustomerPage};
