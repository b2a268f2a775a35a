pub fn organization_prompt(certificate_text: &str) -> String {
    format!(
        "Extract ONLY the issuing organization's full official name from this certificate.\n\
         Return just the name without any explanations, formatting, or extra text.\n\
         Example: \"Certiprof, LLC\" or \"Amazon Web Services\"\n\
         \n\
         Certificate text:\n\
         {certificate_text}\n"
    )
}

pub fn skills_prompt(certificate_text: &str) -> String {
    format!(
        "Extract ONLY a comma-separated list of technical skills from this certificate.\n\
         Include both explicit and inferred skills. Avoid explanations or formatting.\n\
         Example: \"Scrum Framework, Agile Methodology, Sprint Planning\"\n\
         \n\
         Certificate text:\n\
         {certificate_text}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_embed_full_text() {
        let text = "Jane Doe\nCompleted on 5 June 2022";
        assert!(
            organization_prompt(text)
                .ends_with("Certificate text:\nJane Doe\nCompleted on 5 June 2022\n")
        );
        assert!(skills_prompt(text).contains("comma-separated list"));
    }
}
