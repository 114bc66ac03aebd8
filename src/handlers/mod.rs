pub mod faults;
pub mod health;
pub mod hello;
pub mod latency;
