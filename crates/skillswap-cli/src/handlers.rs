use anyhow::Result;
use tracing::debug;

use skillswap_core::{AppState, auth, requests, reviews, skills, users};
use skillswap_types::SwapError;
use skillswap_types::api::{
    NewRequest, NewReview, NewUser, ProfileUpdate, RequestFilter, RequestUpdate, ReviewFilter,
};
use skillswap_types::models::{Identity, ReviewList};

use crate::cli::{
    Cli, Commands, DbAction, Display, RequestAction, ReviewAction, SkillAction, UserAction, prompt,
};
use crate::config::Config;
use crate::session::{SessionFile, StoredSession};

struct Ctx<'a> {
    state: AppState,
    session: SessionFile,
    display: &'a Display,
}

impl Ctx<'_> {
    /// The logged-in user. A session the store no longer honours is forgotten.
    fn identity(&self) -> Result<Identity> {
        let stored = self.session.load()?.ok_or(SwapError::NotAuthenticated)?;
        match auth::resolve(&self.state, &stored.token) {
            Ok(identity) => Ok(identity),
            Err(SwapError::NotAuthenticated) => {
                debug!(path = %self.session.path().display(), "Discarding stale session");
                self.session.clear()?;
                Err(SwapError::NotAuthenticated.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

pub fn run(cli: Cli, display: &Display) -> Result<()> {
    let config = Config::from_cli(&cli);
    let ctx = Ctx {
        state: config.open_state()?,
        session: config.session_file(),
        display,
    };

    match cli.command {
        Commands::Register {
            username,
            email,
            full_name,
            bio,
            password_stdin,
        } => cmd_register(&ctx, username, email, full_name, bio, password_stdin),
        Commands::Login {
            username,
            password_stdin,
        } => cmd_login(&ctx, username, password_stdin),
        Commands::Logout => cmd_logout(&ctx),
        Commands::User { action } => cmd_user(&ctx, action),
        Commands::Skill { action } => cmd_skill(&ctx, action),
        Commands::Request { action } => cmd_request(&ctx, action),
        Commands::Review { action } => cmd_review(&ctx, action),
        Commands::Db { action } => cmd_db(&ctx, action),
    }
}

fn cmd_register(
    ctx: &Ctx,
    username: Option<String>,
    email: Option<String>,
    full_name: Option<String>,
    bio: Option<String>,
    password_stdin: bool,
) -> Result<()> {
    let username = prompt::text("Username", username)?;
    let email = prompt::text("Email", email)?;
    let password = prompt::password(password_stdin, true)?;

    let user = auth::register(
        &ctx.state,
        NewUser {
            username,
            email,
            password,
            full_name,
            bio,
        },
    )?;

    ctx.display
        .print_success(&format!("User '{}' registered successfully!", user.username));
    ctx.display.print_user(&user)
}

fn cmd_login(ctx: &Ctx, username: Option<String>, password_stdin: bool) -> Result<()> {
    let username = prompt::text("Username", username)?;
    let password = prompt::password(password_stdin, false)?;

    let session = auth::login(&ctx.state, &username, &password)?;
    ctx.session.save(&StoredSession::from(&session))?;

    ctx.display
        .print_message(&format!("Welcome back, {}!", session.identity.username))
}

fn cmd_logout(ctx: &Ctx) -> Result<()> {
    let Some(stored) = ctx.session.load()? else {
        ctx.display.print_info("Not logged in.");
        return Ok(());
    };

    auth::logout(&ctx.state, &stored.token)?;
    ctx.session.clear()?;
    ctx.display.print_message(&format!("Goodbye, {}!", stored.username))
}

fn cmd_user(ctx: &Ctx, action: UserAction) -> Result<()> {
    match action {
        UserAction::List => {
            ctx.identity()?;
            ctx.display.print_users(&users::list(&ctx.state)?)
        }
        UserAction::View { id } => {
            ctx.identity()?;
            ctx.display.print_profile(&users::view(&ctx.state, id)?)
        }
        UserAction::Update {
            username,
            email,
            full_name,
            bio,
        } => {
            let me = ctx.identity()?;
            let user = users::update_profile(
                &ctx.state,
                &me,
                ProfileUpdate {
                    username,
                    email,
                    full_name,
                    bio,
                },
            )?;
            ctx.display.print_success("Profile updated");
            ctx.display.print_user(&user)
        }
        UserAction::Delete { yes } => {
            let me = ctx.identity()?;
            if !yes && !prompt::confirm("Delete your account? This cannot be undone")? {
                ctx.display.print_info("Aborted.");
                return Ok(());
            }
            users::delete_account(&ctx.state, &me)?;
            ctx.session.clear()?;
            ctx.display
                .print_message(&format!("Account '{}' deleted", me.username))
        }
    }
}

fn cmd_skill(ctx: &Ctx, action: SkillAction) -> Result<()> {
    match action {
        SkillAction::Add { name } => {
            let me = ctx.identity()?;
            let skill = skills::add(&ctx.state, &me, &name)?;
            ctx.display
                .print_message(&format!("Added '{}' (#{}) to your skills", skill.name, skill.id))
        }
        SkillAction::Remove { id } => {
            let me = ctx.identity()?;
            let skill = skills::remove(&ctx.state, &me, id)?;
            ctx.display
                .print_message(&format!("Removed '{}' from your skills", skill.name))
        }
        SkillAction::List => {
            ctx.identity()?;
            ctx.display.print_skill_summaries(&skills::list(&ctx.state)?)
        }
        SkillAction::Mine => {
            let me = ctx.identity()?;
            ctx.display.print_skills(&skills::mine(&ctx.state, &me)?)
        }
        SkillAction::Browse { id } => {
            ctx.identity()?;
            ctx.display.print_holders(&skills::browse(&ctx.state, id)?)
        }
    }
}

fn cmd_request(ctx: &Ctx, action: RequestAction) -> Result<()> {
    let me = ctx.identity()?;

    match action {
        RequestAction::Create {
            provider,
            skill,
            time,
            duration,
            credit,
            notes,
        } => {
            let request = requests::create(
                &ctx.state,
                &me,
                NewRequest {
                    provider_id: provider,
                    skill_id: skill,
                    time,
                    duration_minutes: duration,
                    credit_cost: credit,
                    notes,
                },
            )?;
            ctx.display
                .print_success(&format!("Service request #{} created", request.id));
            ctx.display.print_request(&request)
        }
        RequestAction::List { user, status } => {
            let filter = RequestFilter {
                user_id: user,
                status: status.map(Into::into),
            };
            ctx.display
                .print_requests(&requests::list(&ctx.state, &me, filter)?)
        }
        RequestAction::View { id } => ctx
            .display
            .print_request_detail(&requests::view(&ctx.state, &me, id)?),
        RequestAction::Update {
            id,
            status,
            notes,
            time,
        } => {
            let request = requests::update(
                &ctx.state,
                &me,
                id,
                RequestUpdate {
                    status: status.map(Into::into),
                    notes,
                    time,
                },
            )?;
            ctx.display
                .print_success(&format!("Service request #{id} updated"));
            ctx.display.print_request(&request)
        }
        RequestAction::Delete { id } => {
            requests::delete(&ctx.state, &me, id)?;
            ctx.display
                .print_message(&format!("Service request #{id} deleted"))
        }
    }
}

fn cmd_review(ctx: &Ctx, action: ReviewAction) -> Result<()> {
    match action {
        ReviewAction::Add {
            request,
            rating,
            comments,
        } => {
            let me = ctx.identity()?;
            let review = reviews::add(
                &ctx.state,
                &me,
                NewReview {
                    request_id: request,
                    rating,
                    comments,
                },
            )?;
            ctx.display
                .print_success(&format!("Review for {} recorded", review.reviewee));
            ctx.display.print_review(&review)
        }
        ReviewAction::List {
            reviewer,
            reviewee,
            request,
        } => {
            let me = ctx.identity()?;
            let filter = match (reviewer, reviewee, request) {
                (Some(id), _, _) => ReviewFilter::ByReviewer(id),
                (None, Some(id), _) => ReviewFilter::ByReviewee(id),
                (None, None, Some(id)) => {
                    let reviews = reviews::for_request(&ctx.state, &me, id)?;
                    return ctx.display.print_reviews(&ReviewList {
                        reviews,
                        average_rating: None,
                    });
                }
                // clap's argument group requires exactly one target.
                (None, None, None) => {
                    anyhow::bail!("one of --reviewer, --reviewee or --request is required")
                }
            };
            ctx.display.print_reviews(&reviews::list(&ctx.state, filter)?)
        }
    }
}

fn cmd_db(ctx: &Ctx, action: DbAction) -> Result<()> {
    match action {
        DbAction::Migrate => ctx.display.print_schema_version(ctx.state.db.schema_version()),
        DbAction::Seed => {
            let added = ctx.state.db.seed_skills()?;
            ctx.display.print_seeded(added)
        }
    }
}
