// src/templates.rs

use axum::response::Html;
use minijinja::Environment;
use serde::Serialize;

use crate::error::AppError;

/// Page templates, embedded at compile time.
const TEMPLATES: [(&str, &str); 8] = [
    ("base.html", include_str!("../templates/base.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("login.html", include_str!("../templates/login.html")),
    ("register.html", include_str!("../templates/register.html")),
    ("dashboard.html", include_str!("../templates/dashboard.html")),
    ("admin_dashboard.html", include_str!("../templates/admin_dashboard.html")),
    ("create_exam.html", include_str!("../templates/create_exam.html")),
    ("take_exam.html", include_str!("../templates/take_exam.html")),
];

/// Builds the template environment. `.html` templates are auto-escaped.
pub fn environment() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    for (name, source) in TEMPLATES {
        env.add_template(name, source)?;
    }
    Ok(env)
}

/// Renders `name` with `ctx` into an HTML response body.
pub fn render<S: Serialize>(
    env: &Environment<'static>,
    name: &str,
    ctx: S,
) -> Result<Html<String>, AppError> {
    let template = env.get_template(name)?;
    Ok(Html(template.render(ctx)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn test_all_templates_compile() {
        let env = environment().unwrap();
        for (name, _) in TEMPLATES {
            assert!(env.get_template(name).is_ok(), "{name} failed to load");
        }
    }

    #[test]
    fn test_flashes_are_escaped() {
        let env = environment().unwrap();
        let page = render(
            &env,
            "index.html",
            context! {
                user => (),
                flashes => vec![context! { category => "error", message => "<b>boom</b>" }],
            },
        )
        .unwrap();
        assert!(page.0.contains("&lt;b&gt;boom"));
        assert!(!page.0.contains("<b>boom"));
    }
}
