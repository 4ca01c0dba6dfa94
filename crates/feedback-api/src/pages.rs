//! Server-rendered HTML. Every piece of user-supplied text goes through
//! [`escape`] before it is written into a page.

use feedback_types::forms::{FeedbackForm, LoginForm, RegisterForm};
use feedback_types::models::{Feedback, User};
use feedback_types::validation::FieldErrors;

use crate::users::user_path;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, current_user: Option<&str>, notices: &[String], body: &str) -> String {
    let nav = match current_user {
        Some(username) => format!(
            r#"<a href="{}">{}</a> | <a href="/logout">Log out</a>"#,
            user_path(username),
            escape(username)
        ),
        None => r#"<a href="/register">Register</a> | <a href="/login">Log in</a>"#.to_string(),
    };

    let mut flashes = String::new();
    for notice in notices {
        flashes.push_str(&format!(r#"<p class="flash">{}</p>"#, escape(notice)));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} | Feedback</title>
</head>
<body>
<nav>{nav}</nav>
{flashes}
<main>
<h1>{title}</h1>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    )
}

fn field(name: &str, label: &str, kind: &str, value: &str, errors: &FieldErrors) -> String {
    let mut html = format!(
        r#"<p><label for="{name}">{label}</label>
<input id="{name}" name="{name}" type="{kind}" value="{value}">"#,
        value = escape(value),
    );
    for message in errors.get(name) {
        html.push_str(&format!(r#"<span class="error">{}</span>"#, escape(message)));
    }
    html.push_str("</p>\n");
    html
}

fn textarea(name: &str, label: &str, value: &str, errors: &FieldErrors) -> String {
    let mut html = format!(
        r#"<p><label for="{name}">{label}</label>
<textarea id="{name}" name="{name}">{value}</textarea>"#,
        value = escape(value),
    );
    for message in errors.get(name) {
        html.push_str(&format!(r#"<span class="error">{}</span>"#, escape(message)));
    }
    html.push_str("</p>\n");
    html
}

pub fn register(
    form: &RegisterForm,
    errors: &FieldErrors,
    current_user: Option<&str>,
    notices: &[String],
) -> String {
    // The password is never echoed back
    let body = [
        r#"<form method="POST" action="/register">"#.to_string(),
        field("username", "Username", "text", &form.username, errors),
        field("password", "Password", "password", "", errors),
        field("email", "Email", "email", &form.email, errors),
        field("first_name", "First Name", "text", &form.first_name, errors),
        field("last_name", "Last Name", "text", &form.last_name, errors),
        r#"<button type="submit">Register</button></form>"#.to_string(),
    ]
    .concat();
    layout("Register", current_user, notices, &body)
}

pub fn login(
    form: &LoginForm,
    errors: &FieldErrors,
    current_user: Option<&str>,
    notices: &[String],
) -> String {
    let body = [
        r#"<form method="POST" action="/login">"#.to_string(),
        field("username", "Username", "text", &form.username, errors),
        field("password", "Password", "password", "", errors),
        r#"<button type="submit">Log in</button></form>"#.to_string(),
    ]
    .concat();
    layout("Log in", current_user, notices, &body)
}

pub fn user_page(user: &User, feedback: &[Feedback], current_user: &str, notices: &[String]) -> String {
    let mut body = format!(
        r#"<section class="profile">
<p>Name: {name}</p>
<p>Email: {email}</p>
</section>
<h2>Feedback</h2>
"#,
        name = escape(&user.full_name()),
        email = escape(&user.email),
    );

    if feedback.is_empty() {
        body.push_str("<p>No feedback yet.</p>\n");
    } else {
        body.push_str("<ul>\n");
        for item in feedback {
            body.push_str(&format!(
                r#"<li><h3>{title}</h3>
<p>{content}</p>
<a href="/feedback/{id}/update">Edit</a>
<form method="POST" action="/feedback/{id}/delete"><button type="submit">Delete</button></form>
</li>
"#,
                title = escape(&item.title),
                content = escape(&item.content),
                id = item.id,
            ));
        }
        body.push_str("</ul>\n");
    }

    body.push_str(&format!(
        r#"<p><a href="{path}/feedback/add">Add feedback</a></p>
<form method="POST" action="{path}/delete"><button type="submit">Delete account</button></form>
"#,
        path = user_path(&user.username),
    ));

    layout(&user.username, Some(current_user), notices, &body)
}

pub fn add_feedback(
    username: &str,
    form: &FeedbackForm,
    errors: &FieldErrors,
    notices: &[String],
) -> String {
    let body = [
        format!(r#"<form method="POST" action="{}/feedback/add">"#, user_path(username)),
        field("title", "Title", "text", &form.title, errors),
        textarea("content", "Content", &form.content, errors),
        r#"<button type="submit">Add</button></form>"#.to_string(),
    ]
    .concat();
    layout("Add feedback", Some(username), notices, &body)
}

pub fn edit_feedback(
    id: i64,
    form: &FeedbackForm,
    errors: &FieldErrors,
    current_user: &str,
    notices: &[String],
) -> String {
    let body = [
        format!(r#"<form method="POST" action="/feedback/{}/update">"#, id),
        field("title", "Title", "text", &form.title, errors),
        textarea("content", "Content", &form.content, errors),
        r#"<button type="submit">Save</button></form>"#.to_string(),
    ]
    .concat();
    layout("Edit feedback", Some(current_user), notices, &body)
}

pub fn not_found() -> String {
    layout("Not Found", None, &[], "<p>The page you requested does not exist.</p>")
}

pub fn server_error() -> String {
    layout("Something went wrong", None, &[], "<p>Please try again later.</p>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"<script>alert("x & 'y'")</script>"#),
            "&lt;script&gt;alert(&quot;x &amp; &#x27;y&#x27;&quot;)&lt;/script&gt;"
        );
    }

    #[test]
    fn form_errors_and_values_are_rendered() {
        let form = RegisterForm {
            username: "<b>".into(),
            password: "secret-pw".into(),
            ..Default::default()
        };
        let errors = form.validate().unwrap_err();
        let html = register(&form, &errors, None, &["Hello".to_string()]);
        assert!(html.contains(r#"value="&lt;b&gt;""#));
        assert!(html.contains("Email can&#x27;t be blank"));
        assert!(html.contains(r#"<p class="flash">Hello</p>"#));
        assert!(!html.contains("secret-pw"));
    }

    #[test]
    fn user_page_lists_feedback_with_controls() {
        let user = User {
            username: "alice".into(),
            email: "a@x.com".into(),
            first_name: "Alice".into(),
            last_name: "A".into(),
        };
        let feedback = vec![Feedback {
            id: 7,
            title: "Hi".into(),
            content: "Hello <there>".into(),
            username: "alice".into(),
        }];
        let html = user_page(&user, &feedback, "alice", &[]);
        assert!(html.contains("Alice A"));
        assert!(html.contains("Hello &lt;there&gt;"));
        assert!(html.contains(r#"action="/feedback/7/delete""#));
        assert!(html.contains(r#"href="/feedback/7/update""#));
        assert!(html.contains(r#"action="/users/alice/delete""#));
    }

    #[test]
    fn usernames_in_links_are_percent_encoded() {
        let user = User {
            username: "José \"q\"/x".into(),
            email: "j@x.com".into(),
            first_name: "J".into(),
            last_name: "S".into(),
        };
        let html = user_page(&user, &[], &user.username, &[]);
        assert!(html.contains(r#"action="/users/Jos%C3%A9%20%22q%22%2Fx/delete""#));
        assert!(html.contains(r#"href="/users/Jos%C3%A9%20%22q%22%2Fx/feedback/add""#));
        assert!(html.contains("José &quot;q&quot;/x"));
    }
}
