pub mod command;

pub use command::TimerCommand;
