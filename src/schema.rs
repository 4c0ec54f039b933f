// Diesel table definitions, kept in sync with DbContext::init_schema.

diesel::table! {
    users (id) {
        id -> Integer,
        username -> Text,
        password_hash -> Text,
        api_key -> Nullable<Text>,
        created_at -> Text,
    }
}

diesel::table! {
    keywords (id) {
        id -> Integer,
        user_id -> Integer,
        keyword -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    authors (id) {
        id -> Integer,
        name -> Text,
    }
}

diesel::table! {
    articles (id) {
        id -> Integer,
        entry_id -> Text,
        user_id -> Integer,
        title -> Text,
        published -> Text,
        pdf_url -> Nullable<Text>,
        original_abstract -> Text,
        local_path -> Nullable<Text>,
        image_paths -> Text,
        is_favorited -> Integer,
        created_at -> Text,
    }
}

diesel::table! {
    article_authors (article_id, author_id) {
        article_id -> Integer,
        author_id -> Integer,
    }
}

diesel::table! {
    analyses (id) {
        id -> Integer,
        article_id -> Integer,
        kind -> Text,
        content -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    qna_history (id) {
        id -> Integer,
        article_id -> Integer,
        question -> Text,
        answer -> Text,
        created_at -> Text,
    }
}

diesel::joinable!(keywords -> users (user_id));
diesel::joinable!(articles -> users (user_id));
diesel::joinable!(article_authors -> articles (article_id));
diesel::joinable!(article_authors -> authors (author_id));
diesel::joinable!(analyses -> articles (article_id));
diesel::joinable!(qna_history -> articles (article_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    keywords,
    authors,
    articles,
    article_authors,
    analyses,
    qna_history,
);
