pub mod adviser;
pub mod dialogue;
pub mod explain;
pub mod telemetry;

pub use adviser::{
    AdviceError, AdviceResponse, Adviser, AdviserRegistry, FALLBACK_MESSAGE, RegistryMode,
};
pub use dialogue::{
    Answer, DialogueError, DialogueMachine, HistoryError, Turn, parse_history, rejection_message,
};
pub use explain::{Explanation, localized_label};
pub use telemetry::{DecisionRecord, TelemetrySink, TelemetrySummary};
