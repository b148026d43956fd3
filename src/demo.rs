use crate::error::Error;
use crate::model::MailboxSource;
use std::fs;
use std::path::Path;
use tracing::info;

struct DemoMessage {
    message_id: &'static str,
    date: &'static str,
    from: &'static str,
    to: &'static str,
    subject: &'static str,
    body: &'static str,
}

const INBOX_MESSAGES: &[DemoMessage] = &[
    DemoMessage {
        message_id: "<team-meeting-duplicate@example.com>",
        date: "Mon, 01 Apr 2025 10:00:00 -0400",
        from: "boss@example.com",
        to: "you@example.com",
        subject: "Team Meeting Tomorrow",
        body: "Let's meet tomorrow at 10 AM to discuss the project progress.",
    },
    DemoMessage {
        message_id: "<team-meeting-duplicate@example.com>",
        date: "Mon, 01 Apr 2025 10:00:00 -0400",
        from: "boss@example.com",
        to: "you@example.com",
        subject: "Team Meeting Tomorrow",
        body: "Let's meet tomorrow at 10 AM to discuss the project progress.",
    },
    DemoMessage {
        message_id: "<company-picnic-duplicate@example.com>",
        date: "Tue, 02 Apr 2025 09:30:00 -0400",
        from: "events@example.com",
        to: "all-staff@example.com",
        subject: "Invitation: Company Picnic",
        body: "You're invited to our annual company picnic this Saturday.",
    },
    DemoMessage {
        message_id: "<company-picnic-duplicate@example.com>",
        date: "Tue, 02 Apr 2025 09:30:00 -0400",
        from: "events@example.com",
        to: "all-staff@example.com",
        subject: "Invitation: Company Picnic",
        body: "You're invited to our annual company picnic this Saturday.",
    },
    DemoMessage {
        message_id: "<company-picnic-duplicate@example.com>",
        date: "Tue, 02 Apr 2025 09:30:00 -0400",
        from: "events@example.com",
        to: "all-staff@example.com",
        subject: "Invitation: Company Picnic",
        body: "You're invited to our annual company picnic this Saturday.",
    },
];

const SENT_MESSAGES: &[DemoMessage] = &[DemoMessage {
    message_id: "<weekly-report-unique@example.com>",
    date: "Wed, 03 Apr 2025 16:15:00 -0400",
    from: "you@example.com",
    to: "manager@example.com",
    subject: "Weekly Report Due",
    body: "Please find my weekly report attached.",
}];

/// Build a pair of demo mailboxes under `dir`: an Inbox holding two
/// duplicate groups (sizes 2 and 3) and a Sent folder with one unique
/// message. Scanning them under `strict` yields exactly two groups and
/// three redundant messages. Doubles as the integration-test fixture.
pub fn create_demo_mailboxes(dir: &Path) -> Result<Vec<MailboxSource>, Error> {
    fs::create_dir_all(dir)?;

    let inbox_path = dir.join("Inbox");
    fs::write(&inbox_path, render_mbox(INBOX_MESSAGES))?;
    let sent_path = dir.join("Sent");
    fs::write(&sent_path, render_mbox(SENT_MESSAGES))?;

    info!("Created demo mailboxes under {}", dir.display());
    Ok(vec![
        MailboxSource::new(inbox_path, "Demo/Inbox"),
        MailboxSource::new(sent_path, "Demo/Sent"),
    ])
}

fn render_mbox(messages: &[DemoMessage]) -> String {
    let mut out = String::new();
    for message in messages {
        out.push_str(&format!(
            "From {} Mon Apr  1 09:00:00 2025\n\
             Message-ID: {}\n\
             Date: {}\n\
             From: {}\n\
             To: {}\n\
             Subject: {}\n\
             \n\
             {}\n\
             \n",
            message.from,
            message.message_id,
            message.date,
            message.from,
            message.to,
            message.subject,
            message.body,
        ));
    }
    out
}
