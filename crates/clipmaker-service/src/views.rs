//! Server-rendered pages.

use std::fmt::Write as _;

use clipmaker_core::{FormState, UserProfile, Viewer, CUSTOM_COUNT_MAX_HINT, PRESET_CLIP_COUNTS};

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:0;background:#f1f5f9;color:#0f172a}\
main{max-width:48rem;margin:0 auto;padding:2rem 1rem}\
.card{background:#fff;border-radius:1rem;box-shadow:0 4px 16px rgba(15,23,42,.08);padding:2rem;margin-bottom:1.5rem}\
.center{text-align:center}.muted{color:#64748b}.error{color:#dc2626}\
.button{display:inline-block;padding:.75rem 1.5rem;border-radius:.5rem;background:#2563eb;color:#fff;text-decoration:none;border:0;font-weight:600}\
.button.secondary{background:#475569}.button:disabled{background:#cbd5e1;color:#64748b}\
.presets{display:grid;grid-template-columns:repeat(3,1fr);gap:.75rem;margin-bottom:1rem}\
.preset{padding:1rem;border:2px solid #e2e8f0;border-radius:.75rem;background:#fff;font-weight:600}\
.preset.selected{border-color:#3b82f6;background:#eff6ff;color:#1d4ed8}\
.summary{background:#eff6ff;border:1px solid #bfdbfe;border-radius:.75rem;padding:1rem;color:#1e40af}\
.notice{border-radius:.75rem;padding:1rem;margin-bottom:1rem}.notice.success{background:#f0fdf4;color:#166534}\
.notice.rejected{background:#fef2f2;color:#991b1b}\
header{display:flex;justify-content:space-between;align-items:center;background:#fff;padding:1rem 2rem;border-bottom:1px solid #e2e8f0}\
.avatar{width:2rem;height:2rem;border-radius:50%;background:#4f46e5;color:#fff;display:inline-flex;align-items:center;justify-content:center}\
input{width:100%;box-sizing:border-box;padding:1rem;font-size:1rem;border:1px solid #cbd5e1;border-radius:.75rem}\
.features{display:grid;grid-template-columns:repeat(3,1fr);gap:1rem}";

/// Message shown above the form after a submit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Rejected(String),
}

/// Escape text for use in element content and double-quoted attributes.
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_html(title),
        STYLE,
        body
    )
}

/// Landing page. The dashboard link is only shown when a company is configured.
pub fn landing(install_url: &str, dashboard_url: Option<&str>) -> String {
    let dashboard = dashboard_url
        .map(|url| {
            format!(
                "<p><a href=\"{}\">Open the creator dashboard</a></p>",
                escape_html(url)
            )
        })
        .unwrap_or_default();
    let body = format!(
        "<main><div class=\"card center\">\
         <h1>AI Video Clip Maker</h1>\
         <p class=\"muted\">Open this app from an experience on your community to start making clips.</p>\
         <p><a class=\"button\" href=\"{}\">Install the app</a></p>\
         {}<p><a href=\"/example\">Check your sign-in</a></p>\
         </div></main>",
        escape_html(install_url),
        dashboard
    );
    layout("AI Video Clip Maker", &body)
}

/// Shown whenever identity cannot be established or a lookup fails.
pub fn authentication_required() -> String {
    let body = "<main><div class=\"card center\">\
                <h1>Authentication Required</h1>\
                <p class=\"muted\">Please access this app through a Whop experience to continue.</p>\
                <a class=\"button secondary\" href=\"/\">&larr; Back to Home</a>\
                </div></main>";
    layout("Authentication Required", body)
}

pub fn access_denied(checkout_url: &str) -> String {
    let body = format!(
        "<main><div class=\"card center\">\
         <h1>Access Denied</h1>\
         <p class=\"muted\">You don't have access to this video clip maker. Please purchase a plan to continue.</p>\
         <a class=\"button\" href=\"{}\">Get Access</a>\
         </div></main>",
        escape_html(checkout_url)
    );
    layout("Access Denied", &body)
}

pub fn example_authenticated(user: &UserProfile) -> String {
    let body = format!(
        "<main><div class=\"card\">\
         <h1>Welcome to Your Custom Page!</h1>\
         <div class=\"notice success\"><h2>Authentication Success!</h2>\
         <p>Hello <strong>{}</strong> (@{})! You are successfully authenticated.</p>\
         <p class=\"muted\">User ID: {}</p></div>\
         <h3>Authentication Features</h3>\
         <ul><li>User token verification</li><li>User information retrieval</li>\
         <li>Access level checking</li><li>Experience-based permissions</li></ul>\
         <p><a class=\"button\" href=\"/\">&larr; Back to Home</a></p>\
         </div></main>",
        escape_html(user.display_name()),
        escape_html(&user.username),
        escape_html(&user.id)
    );
    layout("Authenticated", &body)
}

pub fn example_unauthenticated(token_header: &str) -> String {
    let body = format!(
        "<main><div class=\"card center\">\
         <h1>Authentication Required</h1>\
         <div class=\"notice rejected\"><h2>Access Denied</h2>\
         <p>You need to be authenticated to view this page. \
         Please make sure you're accessing this page through a Whop experience.</p></div>\
         <h3>How to test authentication:</h3>\
         <ol class=\"muted\" style=\"text-align:left\">\
         <li>Configure the platform api key and app id</li>\
         <li>Install your app in a Whop community</li>\
         <li>Access this page through the Whop experience URL</li>\
         <li>Or send a fixture token in the <code>{}</code> header</li>\
         </ol>\
         <a class=\"button secondary\" href=\"/\">&larr; Back to Home</a>\
         </div></main>",
        escape_html(token_header)
    );
    layout("Authentication Required", &body)
}

/// The clip maker: header with the viewer, the form, and the feature cards.
pub fn clip_maker(
    viewer: &Viewer,
    form: &FormState,
    notice: Option<&Notice>,
) -> String {
    let mut body = String::new();

    let _ = write!(
        body,
        "<header><div><h1>{}</h1><p class=\"muted\">Video Clip Maker</p></div>\
         <div><span>Welcome, {}</span> <span class=\"muted\">@{}</span> \
         <span class=\"avatar\">{}</span></div></header>",
        escape_html(&viewer.experience.name),
        escape_html(viewer.user.display_name()),
        escape_html(&viewer.user.username),
        escape_html(&viewer.user.initial())
    );

    body.push_str(
        "<main><div class=\"center\"><h2>AI Video Clip Maker</h2>\
         <p class=\"muted\">Transform your long-form videos into engaging short clips automatically. \
         Just paste your video URL and choose how many clips you want to create.</p></div>",
    );

    match notice {
        Some(Notice::Success(message)) => {
            let _ = write!(
                body,
                "<div class=\"notice success\" role=\"alert\">{}</div>",
                escape_html(message)
            );
        }
        Some(Notice::Rejected(message)) => {
            let _ = write!(
                body,
                "<div class=\"notice rejected\" role=\"alert\">{}</div>",
                escape_html(message)
            );
        }
        None => {}
    }

    body.push_str(&form_card(form));

    body.push_str(
        "<div class=\"features\">\
         <div class=\"card\"><h3>Lightning Fast</h3><p class=\"muted\">AI-powered processing creates your clips in minutes, not hours.</p></div>\
         <div class=\"card\"><h3>Smart Selection</h3><p class=\"muted\">Advanced AI identifies the most engaging moments automatically.</p></div>\
         <div class=\"card\"><h3>Ready to Share</h3><p class=\"muted\">Clips are optimized for social media platforms and ready to post.</p></div>\
         </div></main>",
    );

    layout(&viewer.experience.name, &body)
}

/// Posts back to the page URL; the hidden fields carry the rendered count state.
fn form_card(form: &FormState) -> String {
    let mut html = String::new();
    let preset = form
        .selected_preset()
        .map(|count| count.to_string())
        .unwrap_or_default();

    let _ = write!(
        html,
        "<div class=\"card\"><form method=\"post\">\
         <input type=\"hidden\" name=\"preset\" value=\"{}\">\
         <input type=\"hidden\" name=\"rendered_custom\" value=\"{}\">\
         <p><button type=\"submit\" class=\"button secondary\" name=\"action\" value=\"update\">Apply changes</button></p>",
        preset,
        escape_html(form.custom_count())
    );

    let _ = write!(
        html,
        "<label for=\"video_url\"><strong>Video URL</strong></label>\
         <input id=\"video_url\" name=\"video_url\" type=\"url\" value=\"{}\" \
         placeholder=\"https://youtube.com/watch?v=... or https://vimeo.com/...\">",
        escape_html(form.video_url())
    );
    if form.show_url_error() {
        let _ = write!(
            html,
            "<p class=\"error\">{}</p>",
            escape_html(form.policy().invalid_hint())
        );
    }

    html.push_str("<p><strong>Number of Clips</strong></p><div class=\"presets\">");
    for count in PRESET_CLIP_COUNTS {
        let selected = if form.selected_preset() == Some(count) {
            " selected"
        } else {
            ""
        };
        let _ = write!(
            html,
            "<button type=\"submit\" class=\"preset{}\" name=\"action\" value=\"preset-{}\">{} Clips</button>",
            selected, count, count
        );
    }
    html.push_str("</div>");

    let _ = write!(
        html,
        "<input name=\"custom_count\" type=\"number\" min=\"1\" max=\"{}\" value=\"{}\" \
         placeholder=\"Or enter custom number (1-{})\">",
        CUSTOM_COUNT_MAX_HINT,
        escape_html(form.custom_count()),
        CUSTOM_COUNT_MAX_HINT
    );

    if let Some(count) = form.selected_count().filter(|count| *count != 0) {
        let _ = write!(
            html,
            "<p class=\"summary\">Ready to create {} clips from your video</p>",
            count
        );
    }

    let disabled = if form.submit_enabled() { "" } else { " disabled" };
    let label = if form.is_loading() {
        "Creating Clips..."
    } else {
        "Make Clips Now"
    };
    let _ = write!(
        html,
        "<p><button type=\"submit\" class=\"button\" name=\"action\" value=\"submit\"{}>{}</button></p>\
         </form></div>",
        disabled, label
    );

    html
}
