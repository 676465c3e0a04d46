// src/seed.rs

use crate::{
    config::Config,
    error::AppError,
    models::{
        question::{NewQuestion, OptionLabel},
        quiz::NewQuiz,
        user::{NewUser, ROLE_ADMIN},
    },
    storage::Storage,
    utils::hash::hash_password,
};

/// Creates the configured admin account if it does not exist yet.
pub async fn seed_admin_user<S: Storage + ?Sized>(
    store: &S,
    config: &Config,
) -> Result<(), AppError> {
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password)
    else {
        return Ok(());
    };

    if store.find_user_by_username(username).await?.is_some() {
        return Ok(());
    }

    tracing::info!("Seeding admin user: {}", username);
    store
        .create_user(&NewUser {
            username: username.clone(),
            password: hash_password(password)?,
            full_name: "Administrator".to_string(),
            role: ROLE_ADMIN.to_string(),
        })
        .await?;
    tracing::info!("Admin user created successfully.");
    Ok(())
}

const DEMO_QUESTIONS: [(&str, [&str; 4], OptionLabel); 7] = [
    (
        "Which keyword is used to inherit a class in Java?",
        ["extend", "extends", "inherit", "implements"],
        OptionLabel::B,
    ),
    (
        "Which method is the entry point for a Java app?",
        ["start()", "main()", "run()", "init()"],
        OptionLabel::B,
    ),
    (
        "Which collection does not allow duplicates?",
        ["List", "Set", "Map", "Queue"],
        OptionLabel::B,
    ),
    (
        "What is JVM?",
        [
            "Java Virtual Machine",
            "Java Vendor Model",
            "Just Virtual Maker",
            "Java Variable Memory",
        ],
        OptionLabel::A,
    ),
    (
        "Which access modifier is most restrictive?",
        ["private", "protected", "public", "default"],
        OptionLabel::A,
    ),
    (
        "Which keyword prevents method overriding?",
        ["final", "static", "const", "abstract"],
        OptionLabel::A,
    ),
    (
        "Which package contains ArrayList?",
        ["java.util", "java.lang", "java.io", "java.net"],
        OptionLabel::A,
    ),
];

/// Seeds the "Java Basics" demo quiz (5 of 7 questions, 90 seconds) into an empty catalog.
///
/// Returns the new quiz id, or `None` when quizzes already exist.
pub async fn seed_demo_quiz<S: Storage + ?Sized>(store: &S) -> Result<Option<i64>, AppError> {
    if store.count_quizzes().await? > 0 {
        return Ok(None);
    }

    let quiz = store
        .create_quiz(&NewQuiz {
            title: "Java Basics".to_string(),
            question_count: 5,
            time_limit_seconds: 90,
            active: true,
        })
        .await?;

    for (text, options, correct_option) in DEMO_QUESTIONS {
        store
            .create_question(&NewQuestion {
                quiz_id: quiz.id,
                text: text.to_string(),
                options: options.map(str::to_string),
                correct_option,
                points: 1,
            })
            .await?;
    }

    tracing::info!(
        "Seeded demo quiz #{} with {} questions",
        quiz.id,
        DEMO_QUESTIONS.len()
    );
    Ok(Some(quiz.id))
}
