pub mod etl_jobs;
