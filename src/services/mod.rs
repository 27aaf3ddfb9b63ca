pub mod job_search_service;
