pub mod maintenance;
pub mod phone;

pub use maintenance::MaintenancePage;
