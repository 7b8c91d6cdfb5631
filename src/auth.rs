use anyhow::{Result, bail};
use std::io::{self, IsTerminal};
use zeroize::Zeroizing;

const PASSWORD_ENV: &str = "SEALBOX_PASSWORD";

/// Password for opening an existing file.
pub fn read_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = non_interactive_password()? {
        return Ok(pw);
    }

    let pw = Zeroizing::new(rpassword::prompt_password("Password: ")?);
    if pw.is_empty() {
        bail!("No password provided");
    }
    Ok(pw)
}

/// Password for sealing; asks twice when prompting on a terminal.
pub fn read_new_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = non_interactive_password()? {
        return Ok(pw);
    }

    let pw1 = Zeroizing::new(rpassword::prompt_password("New password: ")?);
    let pw2 = Zeroizing::new(rpassword::prompt_password("Confirm password: ")?);

    if pw1.is_empty() {
        bail!("password cannot be empty");
    }
    if pw1 != pw2 {
        bail!("passwords do not match");
    }
    Ok(pw1)
}

//  SEALBOX_PASSWORD="supersecret" sealbox open --in a.slbx --out a.txt
//  echo "supersecret" | sealbox open --in a.slbx --out a.txt
fn non_interactive_password() -> Result<Option<Zeroizing<String>>> {
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            return Ok(Some(Zeroizing::new(pw)));
        }
    }

    if io::stdin().is_terminal() {
        return Ok(None);
    }

    let mut buf = Zeroizing::new(String::new());
    io::stdin().read_line(&mut buf)?;
    trim_newline(&mut buf);

    if buf.is_empty() {
        bail!("No password provided");
    }
    Ok(Some(buf))
}

fn trim_newline(s: &mut String) {
    while s.ends_with('\n') || s.ends_with('\r') {
        s.pop();
    }
}
