pub mod employee_repo;
pub use employee_repo::EmployeeRepository;
pub mod lead_repo;
pub use lead_repo::LeadRepository;
pub mod callback_repo;
pub use callback_repo::CallbackRepository;
pub mod transfer_repo;
pub use transfer_repo::TransferRepository;
