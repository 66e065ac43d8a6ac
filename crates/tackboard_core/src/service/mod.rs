//! Service layer: session state plus transactional action application.

mod board_service;

pub use board_service::BoardService;
