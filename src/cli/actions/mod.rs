pub mod run;

use crate::gateway::Method;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Whoami,
    Navigate {
        path: String,
    },
    Links,
    Call {
        method: Method,
        path: String,
        body: Option<Value>,
    },
}
