use std::path::PathBuf;

use rollcall::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Login { username: String, password: String },
    Go(ScreenKey),
    Logout,
    Expire,
    Show,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(Command::Show);
    };

    match verb {
        "login" => match (parts.next(), parts.next()) {
            (Some(username), Some(password)) => Ok(Command::Login {
                username: username.to_string(),
                password: password.to_string(),
            }),
            _ => Err("usage: login <username> <password>".into()),
        },
        // Unknown keys land on the dashboard, same as the sidebar.
        "go" => Ok(Command::Go(ScreenKey::from_menu(parts.next().unwrap_or("")))),
        "logout" => Ok(Command::Logout),
        "expire" => Ok(Command::Expire),
        "show" => Ok(Command::Show),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command: {other}")),
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(view: &ShellView<'_>) -> String {
    let mut out = String::new();
    if let Some(note) = &view.notification {
        out.push_str(&format!("[{}] {}\n", note.severity, note.text));
    }
    match &view.body {
        ShellBody::Unauthenticated(form) => {
            out.push_str("== Sign in ==\n");
            if let Some(error) = form.error() {
                out.push_str(&format!("  ! {error}\n"));
            }
            out.push_str("  login <username> <password>\n");
        }
        ShellBody::Authenticated { frame, screen } => {
            out.push_str(&format!(
                "== {} == {} ({}) {}\n",
                frame.title(),
                frame.username,
                frame.role,
                frame.avatar
            ));
            out.push_str(&screen.render());
            out.push('\n');
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

fn store_path() -> PathBuf {
    std::env::var_os("ROLLCALL_STORE")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("rollcall-session.json"))
}

fn api_config() -> ApiConfig {
    match std::env::var("ROLLCALL_API") {
        Ok(base_url) => ApiConfig::with_base_url(base_url),
        Err(_) => ApiConfig::default(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = api_config();
    tracing::info!(base_url = %config.base_url, "starting rollcall console");

    let mut shell = ShellBuilder::new()
        .api_config(config)
        .build_http(FileStore::new(store_path()))?;
    shell.start();
    print!("{}", render(&shell.view()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(usage) => {
                eprintln!("{usage}");
                continue;
            }
        };

        match command {
            Command::Login { username, password } => {
                if let Err(e) = shell.submit_login(Credentials::new(username, password)).await {
                    tracing::debug!(error = %e, "login attempt failed");
                }
            }
            Command::Go(key) => {
                shell.handle(ShellEvent::Navigate(key));
            }
            Command::Logout => {
                shell.handle(ShellEvent::Logout);
            }
            // Stands in for a screen whose request came back 401.
            Command::Expire => match shell.active_screen() {
                Some(screen) => {
                    screen.context().guard_status(401);
                }
                None => eprintln!("nobody is signed in"),
            },
            Command::Show => {}
            Command::Quit => break,
        }

        shell.process_pending();
        print!("{}", render(&shell.view()));
    }

    Ok(())
}
