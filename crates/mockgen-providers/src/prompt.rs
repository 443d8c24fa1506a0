// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Self-contained instruction prompt for mock data generation.

use mockgen_core::types::GenerationRequest;

/// Build the full instruction text sent to a model.
///
/// The prompt states the exact object count, the `id` rules and the output
/// format, then embeds the optional resource type and field schema.
pub fn build_prompt(request: &GenerationRequest) -> String {
    let count = request.object_count;
    let mut prompt = format!(
        "You generate realistic mock data for software testing.\nRequest: {}\n",
        request.prompt.trim()
    );
    if let Some(resource_type) = request.resource_type.as_deref().filter(|s| !s.is_empty()) {
        prompt.push_str(&format!("Each object represents a {resource_type}.\n"));
    }
    if let Some(schema) = request.schema.as_ref().filter(|s| !s.is_empty()) {
        prompt.push_str("Every object must contain these fields:\n");
        for field in schema {
            let line = match field.description.as_deref() {
                Some(desc) => format!("- {} ({}): {desc}\n", field.name, field.field_type),
                None => format!("- {} ({})\n", field.name, field.field_type),
            };
            prompt.push_str(&line);
        }
    }
    prompt.push_str(&format!(
        "\nRules:\n\
         1. Respond with a JSON array of exactly {count} objects and nothing else.\n\
         2. Every object has a numeric \"id\" field, numbered 1 to {count}.\n\
         3. Values are varied and plausible. No placeholders like \"string\" or \"lorem ipsum\".\n\
         4. Do not wrap the array in markdown fences or add commentary."
    ));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockgen_core::types::FieldSpec;

    #[test]
    fn embeds_count_and_rules() {
        let prompt = build_prompt(&GenerationRequest::new("list 3 fruits", 3));
        assert!(prompt.contains("Request: list 3 fruits"));
        assert!(prompt.contains("exactly 3 objects"));
        assert!(prompt.contains("numbered 1 to 3"));
        assert!(!prompt.contains("Each object represents"));
        assert!(prompt.ends_with("or add commentary."));
        assert!(prompt.contains("\n\nRules:\n1. Respond"));
    }

    #[test]
    fn embeds_resource_type_and_schema() {
        let mut request = GenerationRequest::new("users for a CRM", 10);
        request.resource_type = Some("customer".into());
        request.schema = Some(vec![
            FieldSpec {
                name: "email".into(),
                field_type: "string".into(),
                description: Some("work address".into()),
            },
            FieldSpec {
                name: "age".into(),
                field_type: "number".into(),
                description: None,
            },
        ]);
        let prompt = build_prompt(&request);
        assert!(prompt.contains("Each object represents a customer."));
        assert!(prompt.contains("- email (string): work address"));
        assert!(prompt.contains("- age (number)\n"));
    }
}
