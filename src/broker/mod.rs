//! Шлюз брокера задач.
//!
//! - `gateway`: контракт RPC брокера (`BrokerGateway`) и типы запросов.
//! - `client`: клиентский адаптер над шлюзом (таймауты, контекст ошибок,
//!   трассировка).
//! - `memory`: брокер в памяти для тестов и локальных запусков.

pub mod client;
pub mod gateway;
pub mod memory;

pub use client::*;
pub use gateway::*;
pub use memory::*;
