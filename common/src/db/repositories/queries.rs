// Column lists shared by the repositories

/// SQL query fragments for the companies table
pub mod company_queries {
    pub const SELECT_ALL_COLUMNS: &str = "handle, name, description, num_employees, logo_url";

    /// Company columns plus the number of jobs, for use with
    /// `LEFT JOIN jobs ... GROUP BY companies.handle`
    pub const SELECT_WITH_JOB_COUNT: &str = r#"companies.handle, companies.name,
        companies.description, companies.num_employees, companies.logo_url,
        COUNT(jobs.id) AS job_count"#;
}

/// SQL query fragments for the jobs table
pub mod job_queries {
    /// Equity is NUMERIC in the database and is returned as text to keep
    /// its exact decimal representation.
    pub const SELECT_ALL_COLUMNS: &str =
        "id, title, salary, equity::TEXT AS equity, company_handle";
}

/// SQL query fragments for the users table
pub mod user_queries {
    /// Public user columns; the password hash is selected only for login
    pub const SELECT_ALL_COLUMNS: &str = "username, first_name, last_name, email, is_admin";
}
