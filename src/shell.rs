//! Interactive register/login prompt.

use std::io::{self, BufRead, Write};

use crate::auth::Authenticator;
use crate::error::Error;

/// Read one trimmed line, or `None` at end of input.
fn prompt<R, W>(input: &mut R, output: &mut W, label: &str) -> io::Result<Option<String>>
where
    R: BufRead,
    W: Write,
{
    write!(output, "{}", label)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn register<R, W>(auth: &Authenticator, input: &mut R, output: &mut W) -> io::Result<bool>
where
    R: BufRead,
    W: Write,
{
    let username = match prompt(input, output, "Enter username: ")? {
        Some(u) => u,
        None => return Ok(false),
    };
    let password = match prompt(input, output, "Enter password: ")? {
        Some(p) => p,
        None => return Ok(false),
    };

    match auth.register(&username, &password) {
        Ok(()) => writeln!(output, "Registration successful.")?,
        Err(Error::AlreadyExists(_)) => writeln!(output, "Username already exists.")?,
        Err(Error::InvalidInput(reason)) => writeln!(output, "Invalid input: {}.", reason)?,
        Err(_) => writeln!(output, "Registration failed.")?,
    }
    Ok(true)
}

fn login<R, W>(auth: &Authenticator, input: &mut R, output: &mut W) -> io::Result<bool>
where
    R: BufRead,
    W: Write,
{
    let username = match prompt(input, output, "Enter username: ")? {
        Some(u) => u,
        None => return Ok(false),
    };
    let password = match prompt(input, output, "Enter password: ")? {
        Some(p) => p,
        None => return Ok(false),
    };

    match auth.verify(&username, &password) {
        Ok(true) => writeln!(output, "Login successful.")?,
        Ok(false) => writeln!(output, "Invalid credentials.")?,
        Err(_) => writeln!(output, "Login failed.")?,
    }
    Ok(true)
}

/// Run the menu loop until the user exits or input runs out.
pub fn run<R, W>(auth: &Authenticator, mut input: R, mut output: W) -> io::Result<()>
where
    R: BufRead,
    W: Write,
{
    loop {
        writeln!(output, "\n=== USER AUTH SYSTEM ===")?;
        writeln!(output, "1) Register")?;
        writeln!(output, "2) Login")?;
        writeln!(output, "3) Exit")?;

        let choice = match prompt(&mut input, &mut output, "Choose an option: ")? {
            Some(c) => c,
            None => return Ok(()),
        };

        let more = match choice.as_str() {
            "1" => register(auth, &mut input, &mut output)?,
            "2" => login(auth, &mut input, &mut output)?,
            "3" => {
                writeln!(output, "bye")?;
                return Ok(());
            }
            _ => {
                writeln!(output, "Invalid choice. Please enter 1, 2, or 3.")?;
                true
            }
        };

        if !more {
            return Ok(());
        }
    }
}
