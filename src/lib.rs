// Library surface for the binary and for headless/integration tests.
pub mod app;
pub mod app_dirs;
pub mod celebration;
pub mod config;
pub mod error;
pub mod factor;
pub mod game;
pub mod generator;
pub mod logging;
pub mod records;
pub mod runtime;
pub mod scoring;
pub mod service;
pub mod session;
pub mod store;
pub mod ui;
pub mod util;

pub use app::{App, AppState, Control};
pub use config::Config;
pub use error::{QuizError, Result};
pub use game::{AnswerReport, Flow, QuestionView, RoundView};
pub use service::QuizService;
pub use session::{Completion, Difficulty, Mode};
