use crate::error::AppError;
use crate::models::{Provider, QueryOptions};
use crate::traits::LanguageModel;

/// Model the planner asks for when the caller does not pick one.
pub const DEFAULT_PLANNER_MODEL: &str = "o1";

const PLANNER_PREAMBLE: &str = "\
You are an expert AI development planner helping with a programming task.
Your role is to analyze requirements, break down complex tasks, and provide
detailed guidance. Focus on:

1. Thorough analysis of the problem
2. Breaking down tasks into manageable steps
3. Identifying potential challenges and solutions
4. Suggesting specific implementation approaches
5. Providing concrete code structure recommendations
";

/// Build the planner prompt for `task`, optionally embedding a file.
pub fn planning_prompt(task: &str, file_content: Option<&str>) -> String {
    let mut prompt = format!("\n{PLANNER_PREAMBLE}\nTASK DESCRIPTION:\n{task}\n\n");

    if let Some(content) = file_content {
        prompt.push_str(&format!(
            "\nRELEVANT FILE CONTENT:\n```\n{content}\n```\n\n\
             Based on the above file content and task description, provide a detailed plan.\n"
        ));
    }

    prompt
}

/// Ask `llm` for a plan of `task`.
pub async fn plan<L: LanguageModel>(
    llm: &L,
    provider: Provider,
    task: &str,
    file_content: Option<&str>,
    options: &QueryOptions,
) -> Result<String, AppError> {
    if task.trim().is_empty() {
        return Err(AppError::InvalidInput("planning task must not be empty".into()));
    }

    let prompt = planning_prompt(task, file_content);
    tracing::info!(%provider, model = ?options.model, "Requesting plan");
    llm.ask(provider, &prompt, options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockLanguageModel;

    #[test]
    fn prompt_without_file() {
        let prompt = planning_prompt("Add a cache", None);
        assert!(prompt.contains("expert AI development planner"));
        assert!(prompt.contains("TASK DESCRIPTION:\nAdd a cache\n"));
        assert!(!prompt.contains("RELEVANT FILE CONTENT"));
    }

    #[test]
    fn prompt_with_file() {
        let prompt = planning_prompt("Refactor", Some("fn main() {}"));
        assert!(prompt.contains("RELEVANT FILE CONTENT:\n```\nfn main() {}\n```"));
        assert!(prompt.ends_with("provide a detailed plan.\n"));
    }

    #[tokio::test]
    async fn plan_forwards_prompt_and_options() {
        let llm = MockLanguageModel::new("1. Do it");
        let options = QueryOptions {
            model: Some(DEFAULT_PLANNER_MODEL.into()),
            ..QueryOptions::default()
        };

        let reply = plan(&llm, Provider::OpenAi, "Ship it", None, &options)
            .await
            .unwrap();

        assert_eq!(reply, "1. Do it");
        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].0, Provider::OpenAi);
        assert!(prompts[0].1.contains("Ship it"));
        assert_eq!(prompts[0].2.model.as_deref(), Some("o1"));
    }

    #[tokio::test]
    async fn plan_rejects_empty_task() {
        let llm = MockLanguageModel::new("unused");
        let err = plan(&llm, Provider::Anthropic, "  ", None, &QueryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(llm.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn plan_propagates_llm_errors() {
        let llm = MockLanguageModel::failing("overloaded");
        let err = plan(&llm, Provider::OpenAi, "task", None, &QueryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LlmError { .. }));
    }
}
