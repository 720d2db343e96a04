table! {
    users (id) {
        id -> Integer,
        username -> Text,
        password_hash -> Text,
        role -> Nullable<Text>,
    }
}
