use crate::error::Error;

pub mod mock;

use mock::InputOutput;

/// Maximum allowed input length to prevent memory exhaustion
const MAX_INPUT_LENGTH: usize = 1024;

/// Maximum number of retry attempts for invalid input
const MAX_RETRIES: usize = 3;

/// Prompt the user for input with the given prompt message
///
/// # Errors
/// Returns an error if stdin/stdout operations fail, input is too long,
/// or contains invalid characters.
pub fn prompt_for_input(prompt: &str) -> Result<String, Error> {
    let io = mock::RealInputOutput;
    prompt_for_input_with_io(prompt, &io)
}

/// Present a menu of options and return the selected value
///
/// # Errors
/// Returns an error if no options are provided, if stdin operations fail,
/// or if maximum retry attempts are exceeded
pub fn select_from_options(prompt: &str, options: &[(String, String)]) -> Result<String, Error> {
    let io = mock::RealInputOutput;
    select_from_options_with_io(prompt, options, &io)
}

/// Ask for user confirmation with yes/no prompt
///
/// # Errors
/// Returns an error if stdin operations fail or maximum retry attempts are exceeded
pub fn confirm(prompt: &str) -> Result<bool, Error> {
    let io = mock::RealInputOutput;
    confirm_with_io(prompt, &io)
}

/// Testable version of prompt_for_input that accepts an InputOutput trait
pub fn prompt_for_input_with_io<T: InputOutput>(
    prompt: &str,
    io: &T,
) -> Result<String, Error> {
    io.print(prompt)?;
    io.flush()?;

    let input = io.read_line()?;
    let trimmed_input = input.trim();

    if trimmed_input.len() > MAX_INPUT_LENGTH {
        return Err(Error::interactive_input_too_long(MAX_INPUT_LENGTH));
    }

    if trimmed_input.chars().any(|c| c.is_control() && c != '\t') {
        return Err(Error::interactive_invalid_characters(
            "input contains control characters other than tab",
        ));
    }

    Ok(trimmed_input.to_string())
}

/// Testable version of select_from_options that accepts an InputOutput trait
pub fn select_from_options_with_io<T: InputOutput>(
    prompt: &str,
    options: &[(String, String)],
    io: &T,
) -> Result<String, Error> {
    if options.is_empty() {
        return Err(Error::validation_error("no options available for selection"));
    }

    io.println(prompt)?;
    for (i, (key, description)) in options.iter().enumerate() {
        io.println(&format!("  {}: {} - {}", i + 1, key, description))?;
    }

    for attempt in 1..=MAX_RETRIES {
        let selection = prompt_for_input_with_io("Enter your choice (number or name): ", io)?;

        // Handle empty input as cancellation
        if selection.is_empty() {
            if !confirm_with_io("Do you want to continue with the current operation?", io)? {
                return Err(Error::interactive_cancelled());
            }
            continue;
        }

        if let Ok(num) = selection.parse::<usize>() {
            if num > 0 && num <= options.len() {
                return Ok(options[num - 1].0.clone());
            }
        }

        let selection_lower = selection.to_lowercase();
        for (key, _) in options {
            if key.to_lowercase() == selection_lower {
                return Ok(key.clone());
            }
        }

        if attempt < MAX_RETRIES {
            io.println(&format!(
                "Invalid selection. Please enter a number (1-{}) or a valid name. (Attempt {attempt} of {MAX_RETRIES})",
                options.len()
            ))?;
        }
    }

    Err(Error::interactive_retries_exhausted(MAX_RETRIES))
}

/// Testable version of confirm that accepts an InputOutput trait
pub fn confirm_with_io<T: InputOutput>(prompt: &str, io: &T) -> Result<bool, Error> {
    for attempt in 1..=MAX_RETRIES {
        let response = prompt_for_input_with_io(&format!("{prompt} (y/n): "), io)?;

        if response.is_empty() {
            return Ok(false);
        }

        match response.to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => {
                if attempt < MAX_RETRIES {
                    io.println(&format!(
                        "Please enter 'y' for yes or 'n' for no. (Attempt {attempt} of {MAX_RETRIES})"
                    ))?;
                }
            }
        }
    }

    Err(Error::interactive_retries_exhausted(MAX_RETRIES))
}

/// Prompts for confirmation to exit/cancel an interactive session
///
/// # Errors
/// Returns an error if stdin operations fail
pub fn confirm_exit() -> Result<bool, Error> {
    println!("\nInteractive session interrupted.");
    confirm("Do you want to exit without saving changes?")
}

/// Checks if the user wants to cancel the current operation.
/// Called when empty input is provided as a cancellation signal.
pub fn handle_cancellation_input() -> Result<bool, Error> {
    println!("Empty input detected. This will cancel the current operation.");
    confirm("Do you want to continue with the current operation?")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mock::ScriptedInputOutput;

    #[test]
    fn test_select_from_options_empty() {
        let options = vec![];
        let result = select_from_options("Choose:", &options);
        assert!(result.is_err());
    }

    #[test]
    fn test_select_from_options_by_number() {
        let options = vec![
            ("kg".to_string(), "kilograms".to_string()),
            ("g".to_string(), "grams".to_string()),
        ];
        let io = ScriptedInputOutput::new(["2"]);
        let result = select_from_options_with_io("Choose a unit:", &options, &io).unwrap();
        assert_eq!(result, "g");
    }

    #[test]
    fn test_select_from_options_by_name_case_insensitive() {
        let options = vec![("kg".to_string(), "kilograms".to_string())];
        let io = ScriptedInputOutput::new(["KG"]);
        let result = select_from_options_with_io("Choose a unit:", &options, &io).unwrap();
        assert_eq!(result, "kg");
    }

    #[test]
    fn test_select_from_options_invalid_then_valid() {
        let options = vec![("kg".to_string(), "kilograms".to_string())];
        let io = ScriptedInputOutput::new(["bogus", "kg"]);
        let result = select_from_options_with_io("Choose a unit:", &options, &io).unwrap();
        assert_eq!(result, "kg");
    }

    #[test]
    fn test_select_from_options_retries_exhausted() {
        let options = vec![("kg".to_string(), "kilograms".to_string())];
        let io = ScriptedInputOutput::new(["bogus", "bogus", "bogus"]);
        let result = select_from_options_with_io("Choose a unit:", &options, &io);
        assert!(result.is_err());
    }

    #[test]
    fn test_confirm_yes() {
        let io = ScriptedInputOutput::new(["y"]);
        assert!(confirm_with_io("Proceed?", &io).unwrap());
    }

    #[test]
    fn test_confirm_no() {
        let io = ScriptedInputOutput::new(["n"]);
        assert!(!confirm_with_io("Proceed?", &io).unwrap());
    }

    #[test]
    fn test_confirm_empty_is_no() {
        let io = ScriptedInputOutput::new([""]);
        assert!(!confirm_with_io("Proceed?", &io).unwrap());
    }

    #[test]
    fn test_prompt_for_input_rejects_too_long() {
        let long = "x".repeat(MAX_INPUT_LENGTH + 1);
        let io = ScriptedInputOutput::new([long]);
        let result = prompt_for_input_with_io("Enter:", &io);
        assert!(result.is_err());
    }

    #[test]
    fn test_prompt_for_input_trims_whitespace() {
        let io = ScriptedInputOutput::new(["  hello  "]);
        let result = prompt_for_input_with_io("Enter:", &io).unwrap();
        assert_eq!(result, "hello");
    }
}
