pub const DEFAULT_FOCUS_AREAS: [&str; 3] = ["architecture", "performance", "security"];

pub const REFINEMENT_PROMPT: &str = "\
Based on the previous analysis, please provide:
1. What we might have missed
2. Deeper architectural insights
3. Cross-cutting concerns
";

pub fn iteration_key(iteration: u32) -> String {
    format!("iteration_{iteration}")
}

pub fn refinement_key(iteration: u32) -> String {
    format!("refinement_{iteration}")
}

/// Prompt for the primary call of one iteration.
pub fn primary_prompt(
    repository_url: &str,
    focus_areas: &[String],
    iteration: u32,
    depth: u32,
) -> String {
    format!(
        "You are an autonomous code architect analyzing a software repository.

Repository Context:
Analyzing repository: {repository_url}
Focus areas: {focus}
Iteration: {iteration}/{depth}

Please provide:
1. Architecture analysis
2. Performance bottlenecks
3. Security concerns
4. Code quality issues
5. Specific refactoring recommendations with code examples

Focus on actionable, specific recommendations that could be implemented.
",
        focus = focus_areas.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_prompt_embeds_context_and_sections() {
        let focus = vec!["security".to_string(), "testing".to_string()];
        let prompt = primary_prompt("https://github.com/acme/app", &focus, 2, 3);

        assert!(prompt.contains("Analyzing repository: https://github.com/acme/app"));
        assert!(prompt.contains("Focus areas: security, testing"));
        assert!(prompt.contains("Iteration: 2/3"));
        for section in [
            "Architecture analysis",
            "Performance bottlenecks",
            "Security concerns",
            "Code quality issues",
            "refactoring recommendations",
        ] {
            assert!(prompt.contains(section), "missing section {section}");
        }
    }

    #[test]
    fn finding_keys() {
        assert_eq!(iteration_key(1), "iteration_1");
        assert_eq!(refinement_key(4), "refinement_4");
    }
}
