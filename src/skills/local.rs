//! Convenience wrapper for registering a plain async closure as a
//! [`crate::skills::types::LocalSkillHandler`] (§4.A).

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

use super::types::LocalSkillHandler;

/// Adapts a boxed async function into a [`LocalSkillHandler`], so callers
/// don't need to define a new struct per skill.
pub struct FnSkillHandler<F> {
    func: F,
}

impl<F> FnSkillHandler<F> {
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F, Fut> LocalSkillHandler for FnSkillHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<Value>> + Send,
{
    async fn invoke(&self, input: Value) -> Result<Value> {
        (self.func)(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn fn_handler_forwards_input_to_closure() {
        let handler = FnSkillHandler::new(|input: Value| async move {
            Ok(json!({ "echoed": input }))
        });
        let out = handler.invoke(json!({"a": 1})).await.unwrap();
        assert_eq!(out, json!({"echoed": {"a": 1}}));
    }
}
