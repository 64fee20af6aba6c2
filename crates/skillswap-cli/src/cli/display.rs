use anyhow::Result;
use console::{Style, style};
use serde::Serialize;
use serde_json::json;

use skillswap_core::lifecycle;
use skillswap_types::RequestStatus;
use skillswap_types::models::{
    RequestDetail, Review, ReviewList, ServiceRequest, Skill, SkillHolders, SkillSummary, User,
    UserProfile,
};

use super::OutputFormat;

const TIME_DISPLAY: &str = "%Y-%m-%d %H:%M";

pub struct Display {
    format: OutputFormat,
}

impl Display {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    pub fn print_header(&self, text: &str) {
        println!("{}", style(text).bold().cyan());
        println!("{}", style("─".repeat(50)).dim());
    }

    /// Text-mode notice; JSON output carries the entity that follows instead.
    pub fn print_success(&self, message: &str) {
        if !self.is_json() {
            println!("{} {}", style("✓").green().bold(), message);
        }
    }

    /// Outcome of a command that returns nothing else. In JSON mode, `{ "message": .. }`.
    pub fn print_message(&self, message: &str) -> Result<()> {
        if self.is_json() {
            return self.print_json(&json!({ "message": message }));
        }
        println!("{} {}", style("✓").green().bold(), message);
        Ok(())
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red().bold(), message);
    }

    pub fn print_info(&self, message: &str) {
        if !self.is_json() {
            println!("{} {}", style("→").cyan(), message);
        }
    }

    // -- Users --

    pub fn print_user(&self, user: &User) -> Result<()> {
        if self.is_json() {
            return self.print_json(user);
        }
        self.user_detail(user);
        Ok(())
    }

    pub fn print_profile(&self, profile: &UserProfile) -> Result<()> {
        if self.is_json() {
            return self.print_json(profile);
        }
        self.user_detail(&profile.user);
        println!();
        if profile.skills.is_empty() {
            println!("{}", style("No skills listed").dim());
        } else {
            println!("{}", style("Skills:").bold());
            for skill in &profile.skills {
                println!("  {}", skill_line(skill));
            }
        }
        Ok(())
    }

    pub fn print_users(&self, users: &[User]) -> Result<()> {
        if self.is_json() {
            return self.print_json(users);
        }
        if users.is_empty() {
            println!("{}", style("No users found").dim());
            return Ok(());
        }
        self.print_header("Users");
        for user in users {
            println!("{}", user_line(user));
        }
        Ok(())
    }

    fn user_detail(&self, user: &User) {
        self.print_header(&format!("User #{}", user.id));
        println!("Username:  {}", style(&user.username).bold());
        println!("Email:     {}", user.email);
        if let Some(name) = &user.full_name {
            println!("Full name: {name}");
        }
        if let Some(bio) = &user.bio {
            println!("Bio:       {bio}");
        }
        println!("Joined:    {}", user.created_at.format(TIME_DISPLAY));
    }

    // -- Skills --

    pub fn print_skills(&self, skills: &[Skill]) -> Result<()> {
        if self.is_json() {
            return self.print_json(skills);
        }
        if skills.is_empty() {
            println!("{}", style("No skills yet").dim());
            return Ok(());
        }
        for skill in skills {
            println!("{}", skill_line(skill));
        }
        Ok(())
    }

    pub fn print_skill_summaries(&self, skills: &[SkillSummary]) -> Result<()> {
        if self.is_json() {
            return self.print_json(skills);
        }
        if skills.is_empty() {
            println!("{}", style("No skills yet").dim());
            return Ok(());
        }
        self.print_header("Skills");
        for skill in skills {
            let providers = match skill.holders {
                1 => "1 provider".to_string(),
                n => format!("{n} providers"),
            };
            println!(
                "{:>4}  {}  {}",
                style(format!("#{}", skill.id)).dim(),
                skill.name,
                style(providers).dim()
            );
        }
        Ok(())
    }

    pub fn print_holders(&self, holders: &SkillHolders) -> Result<()> {
        if self.is_json() {
            return self.print_json(holders);
        }
        self.print_header(&format!("Users offering {}", holders.skill.name));
        if holders.users.is_empty() {
            println!("{}", style("Nobody offers this skill right now").dim());
        }
        for user in &holders.users {
            println!("{}", user_line(user));
        }
        Ok(())
    }

    // -- Requests --

    pub fn print_request(&self, request: &ServiceRequest) -> Result<()> {
        if self.is_json() {
            return self.print_json(request);
        }
        self.request_detail(request);
        Ok(())
    }

    pub fn print_request_detail(&self, detail: &RequestDetail) -> Result<()> {
        if self.is_json() {
            return self.print_json(detail);
        }
        self.request_detail(&detail.request);

        if !detail.next_statuses.is_empty() {
            let options: Vec<&str> = detail.next_statuses.iter().map(|s| s.as_str()).collect();
            println!("Next:      {}", style(options.join(", ")).cyan());
        }

        if !detail.reviews.is_empty() {
            println!();
            println!("{}", style("Reviews:").bold());
            for review in &detail.reviews {
                print_review_text(review);
            }
        }
        Ok(())
    }

    pub fn print_requests(&self, requests: &[ServiceRequest]) -> Result<()> {
        if self.is_json() {
            return self.print_json(requests);
        }
        if requests.is_empty() {
            println!("{}", style("No service requests found").dim());
            return Ok(());
        }
        for request in requests {
            println!(
                "{:>4}  {}  {} for {} from {} at {}",
                style(format!("#{}", request.id)).dim(),
                status_label(request.status),
                style(&request.skill).bold(),
                request.requester,
                request.provider,
                request.time.format(TIME_DISPLAY)
            );
        }
        Ok(())
    }

    fn request_detail(&self, request: &ServiceRequest) {
        self.print_header(&format!("Service request #{}", request.id));
        println!("Status:    {}", status_label(request.status));
        println!("Skill:     {}", style(&request.skill).bold());
        println!("Requester: {} (#{})", request.requester, request.requester_id);
        println!("Provider:  {} (#{})", request.provider, request.provider_id);
        println!("Time:      {}", request.time.format(TIME_DISPLAY));
        println!("Duration:  {} minutes", request.duration_minutes);
        println!("Credits:   {}", request.credit_cost);
        if let Some(notes) = &request.notes {
            println!("Notes:     {notes}");
        }
        println!("Updated:   {}", request.updated_at.format(TIME_DISPLAY));
    }

    // -- Reviews --

    pub fn print_review(&self, review: &Review) -> Result<()> {
        if self.is_json() {
            return self.print_json(review);
        }
        print_review_text(review);
        Ok(())
    }

    pub fn print_reviews(&self, list: &ReviewList) -> Result<()> {
        if self.is_json() {
            return self.print_json(list);
        }
        if list.reviews.is_empty() {
            println!("{}", style("No reviews found").dim());
            return Ok(());
        }
        if let Some(avg) = list.average_rating {
            println!(
                "Average rating: {} over {} review(s)",
                style(format!("{avg:.1}")).bold().yellow(),
                list.reviews.len()
            );
            println!();
        }
        for review in &list.reviews {
            print_review_text(review);
        }
        Ok(())
    }

    // -- Admin --

    pub fn print_schema_version(&self, version: i64) -> Result<()> {
        if self.is_json() {
            return self.print_json(&json!({ "schema_version": version }));
        }
        println!("{} Database schema at version {}", style("✓").green().bold(), version);
        Ok(())
    }

    pub fn print_seeded(&self, added: usize) -> Result<()> {
        if self.is_json() {
            return self.print_json(&json!({ "skills_added": added }));
        }
        println!("{} Seeded {} skill(s)", style("✓").green().bold(), added);
        Ok(())
    }
}

fn user_line(user: &User) -> String {
    let name = match &user.full_name {
        Some(full) => format!("{} ({full})", user.username),
        None => user.username.clone(),
    };
    format!("{:>4}  {}  {}", style(format!("#{}", user.id)).dim(), name, style(&user.email).dim())
}

fn skill_line(skill: &Skill) -> String {
    format!("{:>4}  {}", style(format!("#{}", skill.id)).dim(), skill.name)
}

fn print_review_text(review: &Review) {
    let rating = usize::from(review.rating);
    let stars = "★".repeat(rating) + &"☆".repeat(5usize.saturating_sub(rating));
    println!(
        "  {}  {} → {}  {}",
        style(stars).yellow(),
        review.reviewer,
        review.reviewee,
        style(format!("request #{}", review.request_id)).dim()
    );
    if !review.comments.is_empty() {
        println!("      {}", review.comments);
    }
}

fn status_style(status: RequestStatus) -> Style {
    match status {
        RequestStatus::Pending => Style::new().yellow(),
        RequestStatus::Accepted => Style::new().cyan().bold(),
        RequestStatus::Rejected => Style::new().red(),
        RequestStatus::Completed => Style::new().green(),
    }
}

fn status_label(status: RequestStatus) -> String {
    let mut label = status_style(status);
    if lifecycle::is_final(status) {
        label = label.dim();
    }
    label.apply_to(format!("{:<9}", status.as_str())).to_string()
}
