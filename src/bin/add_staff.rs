//! Operator tool that grants a staff member sign-in access by setting their
//! password. The staff record must already exist, created from the staff
//! pages.

use clap::Parser;
use rusqlite::Connection;

use shulebook::{
    PasswordHash, ValidatedPassword, get_staff_by_email, initialize_db, set_staff_password,
};

/// Grant a staff member sign-in access to shulebook.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The staff member's email.
    #[arg(long)]
    email: String,
}

fn main() {
    let args = Args::parse();

    let connection = Connection::open(&args.db_path).expect("Could not open the database file.");
    initialize_db(&connection).expect("Could not initialize the database.");

    let staff = get_staff_by_email(&args.email, &connection).unwrap_or_else(|_| {
        eprintln!(
            "No staff member with the email {} exists. Add them from the staff pages first.",
            args.email
        );
        std::process::exit(1);
    });

    let password = loop {
        let raw_password =
            rpassword::prompt_password("New password: ").expect("Could not read password");
        let confirmation =
            rpassword::prompt_password("Confirm password: ").expect("Could not read password");

        if raw_password != confirmation {
            eprintln!("The passwords do not match, try again.");
            continue;
        }

        match ValidatedPassword::new(&raw_password) {
            Ok(password) => break password,
            Err(error) => eprintln!("{error}, try again."),
        }
    };

    let hash = PasswordHash::new(password, PasswordHash::DEFAULT_COST)
        .expect("Could not hash the password");

    set_staff_password(&args.email, &hash, &connection)
        .expect("Could not store the password hash");

    println!("{} can now sign in.", staff.name);
}
