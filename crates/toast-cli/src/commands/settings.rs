//! Settings and theme handlers

use anyhow::{anyhow, Result};

use toast_core::{Command, Theme};

use super::Session;
use crate::output::{Output, OutputFormat};

pub fn show(session: &Session, output: &Output) -> Result<()> {
    output.print_settings(session.settings());
    Ok(())
}

/// Set one setting by name; values are clamped to their allowed range
pub fn set(session: &mut Session, key: &str, value: &str, output: &Output) -> Result<()> {
    let mut settings = session.settings().clone();
    settings.set(key, value)?;

    if session.dispatch(Command::ApplySettings(settings)).changed {
        output.success(&format!("Set {} = {}", key, value));
    } else {
        output.message("Setting unchanged.");
    }
    Ok(())
}

/// Show or switch theme
pub fn theme(session: &mut Session, name: Option<String>, output: &Output) -> Result<()> {
    let Some(name) = name else {
        match output.format {
            OutputFormat::Json => {
                let names: Vec<_> = Theme::ALL.iter().map(|t| t.name()).collect();
                println!(
                    "{}",
                    serde_json::json!({"theme": session.theme().name(), "available": names})
                );
            }
            OutputFormat::Quiet => println!("{}", session.theme()),
            OutputFormat::Human => {
                for theme in Theme::ALL {
                    let marker = if theme == session.theme() { "*" } else { " " };
                    println!("{} {:<9} {}", marker, theme.name(), theme.label());
                }
            }
        }
        return Ok(());
    };

    let theme: Theme = name.parse().map_err(|e: String| anyhow!(e))?;
    if !session.dispatch(Command::SetTheme(theme)).changed {
        output.message(&format!("{} theme is already active.", theme.label()));
        return Ok(());
    }
    output.success(&theme_message(session.notification(), theme));
    Ok(())
}

/// The theme's notification, or a neutral line for the baseline theme,
/// which has none
fn theme_message(notification: Option<&str>, theme: Theme) -> String {
    match notification {
        Some(message) => message.to_string(),
        None => format!("Theme: {}", theme.name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::open_session;
    use tempfile::TempDir;

    #[test]
    fn test_switching_back_to_dark_is_neutral() {
        let dir = TempDir::new().unwrap();
        let config = toast_core::Config {
            data_dir: dir.path().to_path_buf(),
            log_file: None,
            dictionary_path: None,
            export_dir: None,
        };
        let mut session = open_session(&config).unwrap();

        assert!(session.dispatch(Command::SetTheme(Theme::Sepia)).changed);
        let sepia = theme_message(session.notification(), Theme::Sepia);
        assert_ne!(sepia, "Theme: sepia");

        assert!(session.dispatch(Command::SetTheme(Theme::Dark)).changed);
        assert_eq!(session.notification(), None);
        assert_eq!(theme_message(session.notification(), Theme::Dark), "Theme: dark");
    }
}
