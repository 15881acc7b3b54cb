//! Template engine for dynamic return values.
//!
//! Uses Handlebars for template rendering with the call's context.

use handlebars::Handlebars;
use serde::Serialize;
use serde_json::Value;

/// Template engine for rendering dynamic return values.
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

/// Context for template rendering.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateContext {
    /// Name of the mock receiving the call
    pub mock: String,
    /// Method signature being called
    pub method: String,
    /// Call arguments (callbacks appear as `"<callback>"`)
    pub args: Vec<Value>,
    /// Sequence number of the call on its mock
    pub call: u64,
}

impl TemplateEngine {
    /// Create a new template engine.
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();

        handlebars.register_helper("json", Box::new(json_helper));
        handlebars.register_helper("uuid", Box::new(uuid_helper));
        handlebars.register_helper("now", Box::new(now_helper));
        handlebars.register_helper("random", Box::new(random_helper));
        handlebars.register_helper("default", Box::new(default_helper));
        handlebars.register_helper("upper", Box::new(upper_helper));
        handlebars.register_helper("lower", Box::new(lower_helper));

        // Output is data, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);

        Self { handlebars }
    }

    /// Render a template string with the given context.
    pub fn render(
        &self,
        template: &str,
        ctx: &TemplateContext,
    ) -> Result<String, handlebars::RenderError> {
        self.handlebars.render_template(template, ctx)
    }

    /// Render a JSON value with templates in string fields.
    pub fn render_json(
        &self,
        value: &Value,
        ctx: &TemplateContext,
    ) -> Result<Value, handlebars::RenderError> {
        match value {
            Value::String(s) => {
                if s.contains("{{") {
                    let rendered = self.handlebars.render_template(s, ctx)?;
                    Ok(Value::String(rendered))
                } else {
                    Ok(value.clone())
                }
            }
            Value::Array(arr) => {
                let rendered: Result<Vec<_>, _> =
                    arr.iter().map(|v| self.render_json(v, ctx)).collect();
                Ok(Value::Array(rendered?))
            }
            Value::Object(obj) => {
                let mut rendered = serde_json::Map::new();
                for (k, v) in obj {
                    rendered.insert(k.clone(), self.render_json(v, ctx)?);
                }
                Ok(Value::Object(rendered))
            }
            _ => Ok(value.clone()),
        }
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

// Custom Handlebars helpers

fn json_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let value = h.param(0).map(|v| v.value().clone()).unwrap_or(Value::Null);
    out.write(&serde_json::to_string(&value).unwrap_or_default())?;
    Ok(())
}

fn uuid_helper(
    _: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let uuid = format!(
        "{:08x}-{:04x}-4{:03x}-{:04x}-{:012x}",
        rng.gen::<u32>(),
        rng.gen::<u16>(),
        rng.gen::<u16>() & 0x0fff,
        (rng.gen::<u16>() & 0x3fff) | 0x8000,
        rng.gen::<u64>() & 0xffffffffffff,
    );
    out.write(&uuid)?;
    Ok(())
}

fn now_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let format = h
        .param(0)
        .and_then(|v| v.value().as_str())
        .unwrap_or("%Y-%m-%dT%H:%M:%S%.3fZ");

    out.write(&chrono::Utc::now().format(format).to_string())?;
    Ok(())
}

fn random_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    use rand::Rng;

    let min = h.param(0).and_then(|v| v.value().as_i64()).unwrap_or(0);
    let max = h.param(1).and_then(|v| v.value().as_i64()).unwrap_or(100);

    let value = if max > min {
        rand::thread_rng().gen_range(min..=max)
    } else {
        min
    };
    out.write(&value.to_string())?;
    Ok(())
}

fn default_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let value = h.param(0).map(|v| v.value());
    let default = h.param(1).and_then(|v| v.value().as_str()).unwrap_or("");

    match value {
        Some(Value::String(s)) if !s.is_empty() => out.write(s)?,
        Some(Value::String(_)) | Some(Value::Null) | None => out.write(default)?,
        Some(v) => out.write(&v.to_string())?,
    }
    Ok(())
}

fn upper_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let value = h.param(0).and_then(|v| v.value().as_str()).unwrap_or("");
    out.write(&value.to_uppercase())?;
    Ok(())
}

fn lower_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let value = h.param(0).and_then(|v| v.value().as_str()).unwrap_or("");
    out.write(&value.to_lowercase())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(args: Vec<Value>) -> TemplateContext {
        TemplateContext {
            mock: "view".to_string(),
            method: "end_editing".to_string(),
            args,
            call: 3,
        }
    }

    #[test]
    fn test_simple_template() {
        let engine = TemplateEngine::new();
        let result = engine
            .render("{{mock}}.{{method}} #{{call}}", &ctx(vec![]))
            .unwrap();
        assert_eq!(result, "view.end_editing #3");
    }

    #[test]
    fn test_positional_args() {
        let engine = TemplateEngine::new();
        let result = engine
            .render(
                "Hello, {{args.[0]}} and {{args.[1].name}}.",
                &ctx(vec![json!("world"), json!({"name": "Stubby"})]),
            )
            .unwrap();
        assert_eq!(result, "Hello, world and Stubby.");
    }

    #[test]
    fn test_uuid_helper() {
        let engine = TemplateEngine::new();
        let result = engine.render("ID: {{uuid}}", &ctx(vec![])).unwrap();

        // xxxxxxxx-xxxx-4xxx-xxxx-xxxxxxxxxxxx
        let uuid = &result[4..];
        assert_eq!(uuid.len(), 36);
        assert_eq!(uuid.chars().nth(14), Some('4'));
    }

    #[test]
    fn test_now_helper() {
        let engine = TemplateEngine::new();
        let result = engine.render("{{now \"%Y\"}}", &ctx(vec![])).unwrap();

        assert_eq!(result.len(), 4);
        assert!(result.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(result, chrono::Utc::now().format("%Y").to_string());
    }

    #[test]
    fn test_random_helper_bounds() {
        let engine = TemplateEngine::new();
        let result = engine.render("{{random 5 7}}", &ctx(vec![])).unwrap();
        let n: i64 = result.parse().unwrap();
        assert!((5..=7).contains(&n));
    }

    #[test]
    fn test_default_helper() {
        let engine = TemplateEngine::new();
        let result = engine
            .render("{{default args.[0] \"fallback\"}}", &ctx(vec![Value::Null]))
            .unwrap();
        assert_eq!(result, "fallback");
    }

    #[test]
    fn test_upper_lower_helpers() {
        let engine = TemplateEngine::new();
        let result = engine
            .render(
                "{{upper args.[0]}} {{lower args.[0]}}",
                &ctx(vec![json!("Mamma Mia")]),
            )
            .unwrap();
        assert_eq!(result, "MAMMA MIA mamma mia");
    }

    #[test]
    fn test_json_helper() {
        let engine = TemplateEngine::new();
        let result = engine
            .render("{{json args.[0]}}", &ctx(vec![json!({"row": 420})]))
            .unwrap();
        assert_eq!(result, r#"{"row":420}"#);
    }

    #[test]
    fn test_render_json() {
        let engine = TemplateEngine::new();
        let value = json!({
            "activity_type": "{{args.[0]}}",
            "nested": ["{{method}}", 7],
            "static": "no template"
        });

        let result = engine
            .render_json(&value, &ctx(vec![json!("activity")]))
            .unwrap();

        assert_eq!(result["activity_type"], "activity");
        assert_eq!(result["nested"], json!(["end_editing", 7]));
        assert_eq!(result["static"], "no template");
    }
}
