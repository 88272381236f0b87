use clap::{Args, ValueEnum};
use selfcheckout::{
    api::{LoginKind, SignupRequest},
    auth::Authenticator,
};

use crate::context::Context;

use super::report;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Portal {
    /// Shopper account
    Customer,

    /// Cashier or admin account
    Official,
}

impl From<Portal> for LoginKind {
    fn from(portal: Portal) -> Self {
        match portal {
            Portal::Customer => Self::Customer,
            Portal::Official => Self::Official,
        }
    }
}

#[derive(Debug, Args)]
pub(crate) struct LoginArgs {
    /// Which login to use
    #[arg(value_enum, default_value_t = Portal::Customer)]
    portal: Portal,

    /// Account email
    #[arg(long)]
    email: String,

    /// Account password
    #[arg(long, env = "SELFCHECKOUT_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Debug, Args)]
pub(crate) struct SignupArgs {
    /// Full name
    #[arg(long)]
    name: String,

    /// Email address
    #[arg(long)]
    email: String,

    /// Optional phone number
    #[arg(long)]
    phone: Option<String>,

    /// Password for the new account
    #[arg(long, env = "SELFCHECKOUT_PASSWORD", hide_env_values = true)]
    password: String,
}

fn authenticator(context: &Context) -> Authenticator {
    Authenticator::new(context.api.clone(), context.session.clone())
}

pub(crate) async fn login(context: &Context, args: LoginArgs) -> Result<(), String> {
    authenticator(context)
        .login(args.portal.into(), &args.email, &args.password, |credential| {
            println!("logged in as {}", credential.role);
        })
        .await
        .map_err(|error| report(&error))?;

    Ok(())
}

pub(crate) async fn signup(context: &Context, args: SignupArgs) -> Result<(), String> {
    let profile = authenticator(context)
        .signup(SignupRequest {
            name: args.name,
            email: args.email,
            phone: args.phone,
            password: args.password,
        })
        .await
        .map_err(|error| report(&error))?;

    println!("customer_id: {}", profile.id);
    println!("name: {}", profile.name);
    println!("email: {}", profile.email);
    println!("account created; log in to start shopping");

    Ok(())
}

pub(crate) fn logout(context: &Context) -> Result<(), String> {
    authenticator(context)
        .logout()
        .map_err(|error| report(&error))?;

    println!("logged out");

    Ok(())
}

pub(crate) async fn whoami(context: &Context) -> Result<(), String> {
    if authenticator(context).current().is_none() {
        println!("not logged in");

        return Ok(());
    }

    let identity = context
        .api
        .whoami()
        .await
        .map_err(|error| report(&error))?;

    println!("name: {}", identity.name);
    println!("email: {}", identity.email);
    println!("role: {}", identity.role);

    Ok(())
}
