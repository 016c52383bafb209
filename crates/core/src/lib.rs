pub mod config;
pub mod department;
pub mod engine;
pub mod notify;
pub mod ticket;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    DepartmentSeed, QueueConfig, SanitizedConfig, ServerConfig,
};
pub use department::{Department, DepartmentError, DepartmentStore, SqliteDepartmentStore};
pub use engine::{AdvanceOutcome, JoinOutcome, JoinRequest, QueueEngine, QueueError, QueueStatus};
pub use notify::{ChangeEvent, ChangeNotifier, Trigger};
pub use ticket::{
    is_canonical_phone, NewTicket, SqliteTicketStore, Ticket, TicketError, TicketStatus,
    TicketStore,
};
